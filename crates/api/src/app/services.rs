use std::sync::Arc;

use catalog_infra::{
    db, AppConfig, InMemoryProductStore, PostgresProductStore, ProductService, ProductStore,
};

/// Store handle shared by every request.
pub type DynProductStore = Arc<dyn ProductStore>;

/// Services wired once at startup and shared across handlers.
pub struct AppServices {
    pub products: ProductService<DynProductStore>,
}

impl AppServices {
    pub fn new(store: DynProductStore) -> Self {
        Self {
            products: ProductService::new(store),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryProductStore::new()))
    }

    /// Release the store's resources. Call once after the server stops.
    pub async fn shutdown(&self) {
        self.products.store().close().await;
    }
}

/// Wire services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, sqlx::Error> {
    match db::connect_from_config(config).await? {
        Some(pool) => Ok(AppServices::new(Arc::new(PostgresProductStore::new(pool)))),
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory product store (data is not persisted)");
            Ok(AppServices::in_memory())
        }
    }
}
