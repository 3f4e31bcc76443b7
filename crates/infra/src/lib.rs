//! Infrastructure layer: product storage, service orchestration, config.

pub mod config;
pub mod db;
pub mod service;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use service::{ProductList, ProductService, ServiceError};
pub use store::{InMemoryProductStore, PostgresProductStore, ProductStore, StoreError};
