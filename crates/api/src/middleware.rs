use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use catalog_core::DomainError;

use crate::app::errors;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct ApiKeyState {
    /// Expected key. `None` rejects every write.
    pub api_key: Option<Arc<str>>,
}

impl ApiKeyState {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.map(Arc::from),
        }
    }
}

/// Guard mutating requests with the shared `X-API-Key`. Reads pass through.
pub async fn require_api_key(
    State(state): State<ApiKeyState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_read_only(req.method()) {
        return next.run(req).await;
    }

    let authorized = match (&state.api_key, extract_api_key(req.headers())) {
        (Some(expected), Some(given)) => keys_match(expected.as_bytes(), given.as_bytes()),
        _ => false,
    };
    if authorized {
        return next.run(req).await;
    }

    tracing::warn!(method = %req.method(), path = %req.uri().path(), "rejected write without valid api key");
    errors::domain_error_to_response(DomainError::Unauthorized)
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    let key = headers.get(API_KEY_HEADER)?.to_str().ok()?.trim();
    if key.is_empty() { None } else { Some(key) }
}

/// Compare without short-circuiting on the first differing byte.
fn keys_match(expected: &[u8], given: &[u8]) -> bool {
    if expected.len() != given.len() {
        return false;
    }
    expected
        .iter()
        .zip(given)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn key_comparison() {
        assert!(keys_match(b"s3cret", b"s3cret"));
        assert!(!keys_match(b"s3cret", b"s3creT"));
        assert!(!keys_match(b"s3cret", b"s3cret2"));
    }

    #[test]
    fn blank_header_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("  "));
        assert_eq!(extract_api_key(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(extract_api_key(&headers), Some("abc"));
    }

    #[test]
    fn only_safe_methods_skip_the_check() {
        assert!(is_read_only(&Method::GET));
        assert!(!is_read_only(&Method::POST));
        assert!(!is_read_only(&Method::PUT));
        assert!(!is_read_only(&Method::DELETE));
    }
}
