//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request parsing and JSON:API mapping helpers
//! - `errors.rs`: JSON:API error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub const API_PREFIX: &str = "/api/v1";

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>, api_key: Option<String>) -> Router {
    let key_state = middleware::ApiKeyState::new(api_key);

    // Writes under /api/v1 require the api key.
    let api = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            key_state,
            middleware::require_api_key,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest(API_PREFIX, api)
        .layer(ServiceBuilder::new())
}

pub use services::AppServices;
