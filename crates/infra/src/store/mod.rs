//! Product repository boundary.
//!
//! `ProductStore` is the sole owner of storage interaction for the `products`
//! table. It never validates business rules; the only failure it classifies is
//! the unique-name violation, surfaced as [`StoreError::DuplicateKey`] so the
//! service layer can translate it without sniffing driver error codes.
//!
//! ## Error Mapping
//!
//! | Storage condition | `StoreError` |
//! |-------------------|--------------|
//! | Unique violation (`23505`) | `DuplicateKey` |
//! | Any other driver error | `Database` (unchanged) |
//! | Row that cannot be mapped to a `Product` | `InvalidRow` |
//! | In-memory lock poisoned | `Unavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::ProductId;
use catalog_products::{NewProduct, PageRequest, Product, ProductPatch};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryProductStore;
pub use postgres::PostgresProductStore;

/// Name of the unique constraint guarding `products.name`.
pub const NAME_UNIQUE_CONSTRAINT: &str = "products_name_key";

/// One page of active products plus the active-row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key violates unique constraint {constraint}")]
    DuplicateKey { constraint: String },

    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid product row: {0}")]
    InvalidRow(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

/// Repository over the `products` table.
///
/// Read operations only ever see active rows. Write operations report the
/// number of affected rows and leave "was it there?" to the caller.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Look up an active product. A miss is `Ok(None)`.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// One page of active products and the total count of active products.
    ///
    /// No ordering is part of the contract.
    async fn list(&self, page: PageRequest) -> Result<ProductPage, StoreError>;

    /// Insert a row and return its generated id.
    async fn insert(&self, product: &NewProduct) -> Result<ProductId, StoreError>;

    /// Write exactly the fields present in `patch`.
    ///
    /// Returns 0 when no row has `id`, and 0 without touching storage when the
    /// patch is empty.
    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<u64, StoreError>;

    /// Mark an active row inactive. Returns 0 if it was missing or already inactive.
    async fn soft_delete(&self, id: ProductId) -> Result<u64, StoreError>;

    /// Release underlying resources at shutdown.
    async fn close(&self) {}
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn list(&self, page: PageRequest) -> Result<ProductPage, StoreError> {
        (**self).list(page).await
    }

    async fn insert(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        (**self).insert(product).await
    }

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<u64, StoreError> {
        (**self).update(id, patch).await
    }

    async fn soft_delete(&self, id: ProductId) -> Result<u64, StoreError> {
        (**self).soft_delete(id).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
