//! Product service: validation + persistence orchestration.
//!
//! Flow per operation: input → validator → store → result. The service owns
//! the policy that turns storage signals into domain outcomes:
//!
//! - `DuplicateKey` from the store becomes `InvalidInput("name already exists")`
//! - an empty lookup or a zero-row write becomes `NotFound`
//! - anything else from storage is passed through untouched as `Storage`

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use catalog_core::{DomainError, FieldViolation, ProductId, ViolationKind};
use catalog_products::{validate_create, validate_update, PageMeta, PageRequest, Product};

use crate::store::{ProductStore, StoreError};

/// Message reported when a write collides with an existing product name.
pub const DUPLICATE_NAME_MESSAGE: &str = "name already exists";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl ServiceError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            ServiceError::Storage(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::NotFound(_)))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ServiceError::Domain(DomainError::InvalidInput { .. }))
    }
}

/// The one place a storage error is classified.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { constraint } => {
                tracing::warn!(%constraint, "rejected duplicate product name");
                ServiceError::Domain(DomainError::invalid_input(
                    DUPLICATE_NAME_MESSAGE,
                    vec![FieldViolation::new(
                        "name",
                        ViolationKind::Duplicate,
                        DUPLICATE_NAME_MESSAGE,
                    )],
                ))
            }
            other => ServiceError::Storage(other),
        }
    }
}

/// A listing page as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductList {
    pub data: Vec<Product>,
    pub meta: PageMeta,
}

/// Stateless orchestration over an injected store.
#[derive(Debug, Clone)]
pub struct ProductService<S> {
    store: S,
}

impl<S> ProductService<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, insert, then return the stored row.
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: &Value) -> Result<Product, ServiceError> {
        let product = validate_create(input)?;
        let id = self.store.insert(&product).await?;
        tracing::info!(product_id = %id, "product created");
        self.get_product(id).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ServiceError> {
        match self.store.find_by_id(id).await? {
            Some(product) => Ok(product),
            None => {
                tracing::debug!("product not found");
                Err(not_found(id).into())
            }
        }
    }

    #[instrument(skip(self), fields(page = page.page(), limit = page.limit()))]
    pub async fn list_products(&self, page: PageRequest) -> Result<ProductList, ServiceError> {
        let result = self.store.list(page).await?;
        Ok(ProductList {
            data: result.items,
            meta: PageMeta {
                total: result.total,
                limit: page.limit(),
                offset: page.offset(),
            },
        })
    }

    /// Validate and apply a partial update, returning the full current row.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, input: &Value) -> Result<Product, ServiceError> {
        let patch = validate_update(input)?;
        let affected = self.store.update(id, &patch).await?;
        if affected == 0 {
            tracing::debug!("no product row matched update");
            return Err(not_found(id).into());
        }
        self.get_product(id).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        let affected = self.store.soft_delete(id).await?;
        if affected == 0 {
            return Err(not_found(id).into());
        }
        tracing::info!("product soft-deleted");
        Ok(())
    }
}

fn not_found(id: ProductId) -> DomainError {
    DomainError::not_found(format!("product with id {id} not found"))
}
