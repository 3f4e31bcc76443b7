use serde::Deserialize;
use serde_json::{json, Value};

use catalog_core::{DomainError, FieldViolation, ViolationKind};
use catalog_infra::ProductList;
use catalog_products::Product;

/// JSON:API resource type of a product.
pub const PRODUCT_TYPE: &str = "products";

// -------------------------
// Request DTOs
// -------------------------

/// Raw paging query; validated by `catalog_products::validate_page`.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Parse a request body as untyped JSON so the validator can report on it.
pub fn parse_body(body: &[u8]) -> Result<Value, DomainError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| {
        DomainError::invalid_input(
            "malformed request body",
            vec![FieldViolation::new(
                "body",
                ViolationKind::Type,
                format!("request body must be valid JSON: {e}"),
            )],
        )
    })
}

// -------------------------
// JSON:API mapping helpers
// -------------------------

pub fn product_resource(product: &Product) -> Value {
    json!({
        "type": PRODUCT_TYPE,
        "id": product.id.to_string(),
        "attributes": {
            "name": product.name,
            "description": product.description,
            "price": product.price,
            "is_active": product.is_active,
            "created_at": product.created_at,
            "updated_at": product.updated_at,
        }
    })
}

pub fn product_document(product: &Product) -> Value {
    json!({ "data": product_resource(product) })
}

pub fn product_collection(list: &ProductList) -> Value {
    json!({
        "data": list.data.iter().map(product_resource).collect::<Vec<_>>(),
        "meta": list.meta,
    })
}
