//! JSON:API error responses.
//!
//! Every failure is rendered as `{"errors": [{status, code, title, detail, source?}]}`,
//! with one entry per field violation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use catalog_core::{DomainError, FieldViolation};
use catalog_infra::ServiceError;

pub const INVALID_INPUT_DATA: &str = "INVALID_INPUT_DATA";
pub const RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
pub const UNAUTHORIZED_ACCESS: &str = "UNAUTHORIZED_ACCESS";
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Storage(e) => {
            tracing::error!(error = %e, "storage failure while handling request");
            json_api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_SERVER_ERROR,
                "Internal server error",
                "an unexpected error occurred",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::InvalidInput { message, details } => invalid_input(&message, &details),
        DomainError::NotFound(message) => json_api_error(
            StatusCode::NOT_FOUND,
            RESOURCE_NOT_FOUND,
            "Resource not found",
            message,
        ),
        DomainError::Unauthorized => json_api_error(
            StatusCode::UNAUTHORIZED,
            UNAUTHORIZED_ACCESS,
            "Unauthorized access",
            "the X-API-Key header is missing or incorrect",
        ),
    }
}

fn invalid_input(message: &str, details: &[FieldViolation]) -> Response {
    let status = StatusCode::BAD_REQUEST;
    if details.is_empty() {
        return json_api_error(status, INVALID_INPUT_DATA, "Invalid input data", message);
    }

    let errors = details
        .iter()
        .map(|v| {
            let mut entry = error_object(status, INVALID_INPUT_DATA, "Invalid input data", &v.message);
            entry["source"] = json!({ "pointer": pointer(&v.field) });
            entry["meta"] = json!({ "violation": v.kind });
            entry
        })
        .collect::<Vec<_>>();

    (status, axum::Json(json!({ "errors": errors }))).into_response()
}

/// JSON pointer of a violated field; violations on the whole body point at the root.
fn pointer(field: &str) -> String {
    if field == "body" {
        String::new()
    } else {
        format!("/{field}")
    }
}

fn error_object(status: StatusCode, code: &'static str, title: &'static str, detail: &str) -> Value {
    json!({
        "status": status.as_u16().to_string(),
        "code": code,
        "title": title,
        "detail": detail,
    })
}

pub fn json_api_error(
    status: StatusCode,
    code: &'static str,
    title: &'static str,
    detail: impl Into<String>,
) -> Response {
    let detail = detail.into();
    (
        status,
        axum::Json(json!({ "errors": [error_object(status, code, title, &detail)] })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::ViolationKind;

    async fn body_of(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let res = domain_error_to_response(DomainError::Unauthorized);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = body_of(res).await;
        assert_eq!(body["errors"][0]["code"], UNAUTHORIZED_ACCESS);
        assert_eq!(body["errors"][0]["status"], "401");
    }

    #[tokio::test]
    async fn one_error_entry_per_violation() {
        let err = DomainError::invalid_input(
            "invalid product data",
            vec![
                FieldViolation::new("name", ViolationKind::Length, "too short"),
                FieldViolation::new("body", ViolationKind::NoFields, "at least one field required"),
            ],
        );
        let res = domain_error_to_response(err);
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_of(res).await;
        assert_eq!(body["errors"][0]["source"]["pointer"], "/name");
        assert_eq!(body["errors"][1]["source"]["pointer"], "");
    }
}
