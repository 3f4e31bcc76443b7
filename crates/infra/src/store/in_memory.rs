use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use catalog_core::ProductId;
use catalog_products::{NewProduct, PageRequest, Product, ProductPatch};

use super::{ProductPage, ProductStore, StoreError, NAME_UNIQUE_CONSTRAINT};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<ProductId, Product>,
    last_id: i64,
}

impl Table {
    /// Mirrors the unique constraint on `name`, which covers inactive rows too.
    fn ensure_name_free(&self, name: &str, except: Option<ProductId>) -> Result<(), StoreError> {
        let taken = self
            .rows
            .values()
            .any(|row| row.name == name && Some(row.id) != except);
        if taken {
            return Err(StoreError::DuplicateKey {
                constraint: NAME_UNIQUE_CONSTRAINT.to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory product table.
///
/// Intended for tests/dev. A single lock makes every operation atomic, which
/// stands in for the database's own guarantees.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: RwLock<Table>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw row lookup ignoring `is_active` (test inspection only).
    pub fn row(&self, id: ProductId) -> Option<Product> {
        self.table.read().ok()?.rows.get(&id).cloned()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("in-memory product table lock poisoned".to_string())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.get(&id).filter(|p| p.is_active).cloned())
    }

    async fn list(&self, page: PageRequest) -> Result<ProductPage, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        let active = table.rows.values().filter(|p| p.is_active);

        let total = active.clone().count() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = active
            .skip(offset)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok(ProductPage { items, total })
    }

    async fn insert(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        table.ensure_name_free(&product.name, None)?;

        table.last_id += 1;
        let id = ProductId::new(table.last_id);
        table
            .rows
            .insert(id, product.clone().into_product(id, Utc::now()));
        Ok(id)
    }

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<u64, StoreError> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        if !table.rows.contains_key(&id) {
            return Ok(0);
        }
        if let Some(name) = &patch.name {
            table.ensure_name_free(name, Some(id))?;
        }

        match table.rows.get_mut(&id) {
            Some(row) => {
                patch.apply_to(row, Utc::now());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn soft_delete(&self, id: ProductId) -> Result<u64, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        match table.rows.get_mut(&id) {
            Some(row) if row.is_active => {
                row.is_active = false;
                row.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
