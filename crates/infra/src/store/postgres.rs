//! Postgres-backed product store.
//!
//! Every statement is parameterized. The unique constraint on `name` and the
//! `rows_affected` counts come straight from the database; the store adds no
//! locking of its own.
//!
//! ## Thread Safety
//!
//! `PostgresProductStore` is `Send + Sync`. All operations go through the SQLx
//! connection pool, which queues acquisitions once every connection is busy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use catalog_core::ProductId;
use catalog_products::{NewProduct, PageRequest, Price, Product, ProductPatch};

use super::{ProductPage, ProductStore, StoreError, NAME_UNIQUE_CONSTRAINT};

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_COLUMNS: &str =
    "id, name, description, price, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Create a store over an already-connected pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.map(|r| product_from_row(&r)).transpose()
    }

    #[instrument(skip(self), fields(page = page.page(), limit = page.limit()))]
    async fn list(&self, page: PageRequest) -> Result<ProductPage, StoreError> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| StoreError::InvalidRow(format!("offset {} out of range", page.offset())))?;

        // Ordered by id so consecutive pages do not overlap.
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE is_active = TRUE ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        let items = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage {
            items,
            total: total.max(0) as u64,
        })
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn insert(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, description, price) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&product.name)
        .bind(product.description.as_deref())
        .bind(product.price.amount())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert", e))?;

        Ok(ProductId::new(id))
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<u64, StoreError> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut query = build_update(id, patch);
        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn soft_delete(&self, id: ProductId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("soft_delete", e))?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        tracing::info!("closing postgres connection pool");
        self.pool.close().await;
    }
}

/// `UPDATE products SET <present fields>, updated_at = NOW() WHERE id = $n`.
///
/// Callers must not pass an empty patch.
fn build_update(id: ProductId, patch: &ProductPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE products SET ");
    {
        let mut set = query.separated(", ");
        if let Some(name) = &patch.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(price) = patch.price {
            set.push("price = ").push_bind_unseparated(price.amount());
        }
        if let Some(is_active) = patch.is_active {
            set.push("is_active = ").push_bind_unseparated(is_active);
        }
        set.push("updated_at = NOW()");
    }
    query.push(" WHERE id = ").push_bind(id.get());
    query
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let decode = |e: sqlx::Error| StoreError::InvalidRow(e.to_string());

    let price: Decimal = row.try_get("price").map_err(decode)?;
    let price = Price::new(price).map_err(|e| StoreError::InvalidRow(e.to_string()))?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    Ok(Product {
        id: ProductId::new(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price,
        is_active: row.try_get("is_active").map_err(decode)?,
        created_at,
        updated_at,
    })
}

/// Classify a driver error. Only the unique violation is singled out.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err
                .constraint()
                .unwrap_or(NAME_UNIQUE_CONSTRAINT)
                .to_string();
            tracing::debug!(operation, %constraint, "unique constraint violated");
            return StoreError::DuplicateKey { constraint };
        }
    }
    StoreError::Database {
        operation,
        source: err,
    }
}
