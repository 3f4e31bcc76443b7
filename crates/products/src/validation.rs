//! Input validation for product payloads.
//!
//! Requests arrive as loosely-typed JSON. The functions here check them against
//! the create/update schemas and either return typed values or an
//! `InvalidInput` error listing **every** violation found, never only the first.
//!
//! | field         | create            | update   |
//! |---------------|-------------------|----------|
//! | `name`        | required, 3..=255 | optional |
//! | `description` | optional, null/"" | optional |
//! | `price`       | required, > 0, 2dp| optional |
//! | `is_active`   | not allowed       | optional |
//!
//! Validation never touches storage.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use catalog_core::{DomainError, DomainResult, FieldViolation, ViolationKind};

use crate::pagination::{PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::product::{NewProduct, Price, PriceError, ProductPatch, PRICE_SCALE};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 255;

/// Message of the violation raised for an update carrying no fields.
pub const NO_FIELDS_MESSAGE: &str = "at least one field required";

const CREATE_FIELDS: &[&str] = &["name", "description", "price"];
const UPDATE_FIELDS: &[&str] = &["name", "description", "price", "is_active"];

/// Validate a create payload.
pub fn validate_create(input: &Value) -> DomainResult<NewProduct> {
    let fields = as_object(input, "invalid product data")?;
    let mut violations = Vec::new();

    reject_unknown_fields(fields, CREATE_FIELDS, &mut violations);

    let name = match fields.get("name") {
        Some(value) => name_field(value, &mut violations),
        None => {
            violations.push(required("name"));
            None
        }
    };
    let description = fields
        .get("description")
        .map(|value| description_field(value, &mut violations))
        .unwrap_or(Some(None));
    let price = match fields.get("price") {
        Some(value) => price_field(value, &mut violations),
        None => {
            violations.push(required("price"));
            None
        }
    };

    match (name, description, price) {
        (Some(name), Some(description), Some(price)) if violations.is_empty() => Ok(NewProduct {
            name,
            description,
            price,
        }),
        _ => Err(DomainError::invalid_input("invalid product data", violations)),
    }
}

/// Validate a partial-update payload.
///
/// An update that names no updatable field fails with a dedicated
/// [`ViolationKind::NoFields`] violation.
pub fn validate_update(input: &Value) -> DomainResult<ProductPatch> {
    let fields = as_object(input, "invalid product update")?;
    let mut violations = Vec::new();

    reject_unknown_fields(fields, UPDATE_FIELDS, &mut violations);

    if !UPDATE_FIELDS.iter().any(|f| fields.contains_key(*f)) {
        violations.push(FieldViolation::new(
            "body",
            ViolationKind::NoFields,
            NO_FIELDS_MESSAGE,
        ));
        return Err(DomainError::invalid_input(NO_FIELDS_MESSAGE, violations));
    }

    let patch = ProductPatch {
        name: fields
            .get("name")
            .and_then(|value| name_field(value, &mut violations)),
        description: fields
            .get("description")
            .and_then(|value| description_field(value, &mut violations)),
        price: fields
            .get("price")
            .and_then(|value| price_field(value, &mut violations)),
        is_active: fields
            .get("is_active")
            .and_then(|value| is_active_field(value, &mut violations)),
    };

    if violations.is_empty() {
        Ok(patch)
    } else {
        Err(DomainError::invalid_input("invalid product update", violations))
    }
}

/// Parse raw `page`/`limit` query values, applying defaults when absent.
pub fn validate_page(page: Option<&str>, limit: Option<&str>) -> DomainResult<PageRequest> {
    let mut violations = Vec::new();
    let page = integer_param("page", page, DEFAULT_PAGE, &mut violations);
    let limit = integer_param("limit", limit, DEFAULT_LIMIT, &mut violations);

    if !violations.is_empty() {
        return Err(DomainError::invalid_input("invalid pagination parameters", violations));
    }
    PageRequest::new(page, limit)
}

fn as_object<'a>(input: &'a Value, message: &str) -> DomainResult<&'a Map<String, Value>> {
    input.as_object().ok_or_else(|| {
        DomainError::invalid_input(
            message,
            vec![FieldViolation::new(
                "body",
                ViolationKind::Type,
                "request body must be a JSON object",
            )],
        )
    })
}

fn reject_unknown_fields(
    fields: &Map<String, Value>,
    allowed: &[&str],
    violations: &mut Vec<FieldViolation>,
) {
    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            violations.push(FieldViolation::new(
                key.clone(),
                ViolationKind::UnknownField,
                format!("{key:?} is not allowed"),
            ));
        }
    }
}

fn required(field: &str) -> FieldViolation {
    FieldViolation::new(field, ViolationKind::Required, format!("{field} is required"))
}

fn name_field(value: &Value, violations: &mut Vec<FieldViolation>) -> Option<String> {
    let Some(name) = value.as_str() else {
        violations.push(FieldViolation::new(
            "name",
            ViolationKind::Type,
            "name must be a string",
        ));
        return None;
    };

    let chars = name.chars().count();
    if chars < NAME_MIN_CHARS {
        violations.push(FieldViolation::new(
            "name",
            ViolationKind::Length,
            format!("name must be at least {NAME_MIN_CHARS} characters long"),
        ));
        return None;
    }
    if chars > NAME_MAX_CHARS {
        violations.push(FieldViolation::new(
            "name",
            ViolationKind::Length,
            format!("name must be at most {NAME_MAX_CHARS} characters long"),
        ));
        return None;
    }
    Some(name.to_string())
}

/// `Some(None)` for an explicit null.
fn description_field(
    value: &Value,
    violations: &mut Vec<FieldViolation>,
) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => {
            violations.push(FieldViolation::new(
                "description",
                ViolationKind::Type,
                "description must be a string or null",
            ));
            None
        }
    }
}

fn price_field(value: &Value, violations: &mut Vec<FieldViolation>) -> Option<Price> {
    let amount = match decimal_from_json(value) {
        Ok(amount) => amount,
        Err(PriceInput::NotNumeric) => {
            violations.push(FieldViolation::new(
                "price",
                ViolationKind::Type,
                "price must be a number",
            ));
            return None;
        }
        Err(PriceInput::Invalid(err)) => {
            violations.push(price_violation(err));
            return None;
        }
    };

    match Price::new(amount) {
        Ok(price) => Some(price),
        Err(err) => {
            violations.push(price_violation(err));
            None
        }
    }
}

fn price_violation(err: PriceError) -> FieldViolation {
    let kind = match err {
        PriceError::NotPositive | PriceError::TooLarge => ViolationKind::Range,
        PriceError::TooPrecise => ViolationKind::Precision,
    };
    FieldViolation::new("price", kind, err.to_string())
}

/// Integer digits a price may carry (`NUMERIC(12, 2)`).
const PRICE_INTEGER_DIGITS: i64 = 10;

/// Exponents are clamped here; anything this far out is already rejected.
const EXPONENT_LIMIT: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceInput {
    NotNumeric,
    Invalid(PriceError),
}

/// Exact decimal from a JSON number or numeric string.
///
/// Works on the literal text. With `serde_json`'s `arbitrary_precision` a
/// number's text is exactly what the client sent, so digits past the price
/// scale are reported instead of being rounded away by `f64` or `Decimal`.
fn decimal_from_json(value: &Value) -> Result<Decimal, PriceInput> {
    match value {
        Value::Number(n) => parse_exact_decimal(&n.to_string()),
        Value::String(s) => parse_exact_decimal(s.trim()),
        _ => Err(PriceInput::NotNumeric),
    }
}

/// Parse `[+-]digits[.digits][(e|E)[+-]digits]` without losing digits.
fn parse_exact_decimal(text: &str) -> Result<Decimal, PriceInput> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, parse_exponent(exponent)?),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(PriceInput::NotNumeric);
    }

    let digits = format!("{int_part}{frac_part}");
    let trimmed = digits.trim_start_matches('0');
    let leading_zeros = (digits.len() - trimmed.len()) as i64;
    let significant = trimmed.trim_end_matches('0');
    if significant.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if negative {
        return Err(PriceInput::Invalid(PriceError::NotPositive));
    }

    // Decimal point position relative to the first significant digit.
    let point = int_part.len() as i64 - leading_zeros + exponent;
    let fraction_digits = significant.len() as i64 - point;
    if point > PRICE_INTEGER_DIGITS {
        return Err(PriceInput::Invalid(PriceError::TooLarge));
    }
    if fraction_digits > i64::from(PRICE_SCALE) {
        return Err(PriceInput::Invalid(PriceError::TooPrecise));
    }

    // At most 12 significant digits remain, so this fits comfortably.
    let mut units: i128 = significant
        .parse()
        .map_err(|_| PriceInput::Invalid(PriceError::TooLarge))?;
    if fraction_digits < 0 {
        units *= 10i128.pow(fraction_digits.unsigned_abs() as u32);
    }
    let scale = u32::try_from(fraction_digits.max(0)).unwrap_or(PRICE_SCALE);
    Decimal::try_from_i128_with_scale(units, scale)
        .map_err(|_| PriceInput::Invalid(PriceError::TooLarge))
}

fn parse_exponent(text: &str) -> Result<i64, PriceInput> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PriceInput::NotNumeric);
    }
    let magnitude = digits.parse::<u64>().unwrap_or(u64::MAX).min(EXPONENT_LIMIT) as i64;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Booleans, or the strings `"true"`/`"false"` in any case.
fn is_active_field(value: &Value, violations: &mut Vec<FieldViolation>) -> Option<bool> {
    let flag = match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    };
    if flag.is_none() {
        violations.push(FieldViolation::new(
            "is_active",
            ViolationKind::Type,
            "is_active must be a boolean",
        ));
    }
    flag
}

fn integer_param(
    field: &str,
    raw: Option<&str>,
    default: u32,
    violations: &mut Vec<FieldViolation>,
) -> u32 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return default;
    };
    match raw.parse::<i64>() {
        Ok(v) if v >= 0 => u32::try_from(v).unwrap_or(u32::MAX),
        Ok(_) => {
            violations.push(FieldViolation::new(
                field,
                ViolationKind::Range,
                format!("{field} must not be negative"),
            ));
            default
        }
        Err(_) => {
            violations.push(FieldViolation::new(
                field,
                ViolationKind::Type,
                format!("{field} must be an integer"),
            ));
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds(err: &DomainError) -> Vec<(String, ViolationKind)> {
        err.details()
            .iter()
            .map(|v| (v.field.clone(), v.kind))
            .collect()
    }

    #[test]
    fn create_accepts_minimal_valid_payload() {
        let product = validate_create(&json!({ "name": "Widget", "price": 10 })).unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.description, None);
        assert_eq!(product.price.to_string(), "10.00");
    }

    #[test]
    fn create_keeps_empty_and_null_descriptions() {
        let empty = validate_create(&json!({ "name": "Widget", "price": 1, "description": "" })).unwrap();
        assert_eq!(empty.description, Some(String::new()));

        let null = validate_create(&json!({ "name": "Widget", "price": 1, "description": null })).unwrap();
        assert_eq!(null.description, None);
    }

    #[test]
    fn create_collects_every_violation() {
        let err = validate_create(&json!({ "name": "P", "price": -5, "is_active": true })).unwrap_err();
        let found = kinds(&err);
        assert!(found.contains(&("name".to_string(), ViolationKind::Length)));
        assert!(found.contains(&("price".to_string(), ViolationKind::Range)));
        assert!(found.contains(&("is_active".to_string(), ViolationKind::UnknownField)));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn create_reports_missing_required_fields() {
        let err = validate_create(&json!({})).unwrap_err();
        assert_eq!(
            kinds(&err),
            vec![
                ("name".to_string(), ViolationKind::Required),
                ("price".to_string(), ViolationKind::Required),
            ]
        );
    }

    #[test]
    fn create_rejects_excess_price_precision_without_rounding() {
        let err = validate_create(&json!({ "name": "Widget", "price": 10.999 })).unwrap_err();
        assert_eq!(kinds(&err), vec![("price".to_string(), ViolationKind::Precision)]);
    }

    #[test]
    fn long_fractional_tails_are_precision_violations() {
        // Raw JSON text, so the number reaches the validator as written.
        for body in [
            r#"{"name":"Widget","price":19.999999999999999}"#,
            r#"{"name":"Widget","price":10.0000000000000001}"#,
            r#"{"name":"Widget","price":"1.0000000000000000000000000000001"}"#,
            r#"{"name":"Widget","price":"0.0000000000000000000000000000001"}"#,
            r#"{"name":"Widget","price":1234e-5}"#,
        ] {
            let input: Value = serde_json::from_str(body).unwrap();
            let err = validate_create(&input).unwrap_err();
            assert_eq!(kinds(&err), vec![("price".to_string(), ViolationKind::Precision)], "{body}");
        }
    }

    #[test]
    fn trailing_zeros_and_exponents_within_scale_are_accepted() {
        for (body, expected) in [
            (r#"{"name":"Widget","price":10.000000000000000000000000000000}"#, "10.00"),
            (r#"{"name":"Widget","price":"1.5e1"}"#, "15.00"),
            (r#"{"name":"Widget","price":125E-2}"#, "1.25"),
            (r#"{"name":"Widget","price":"9999999999.99"}"#, "9999999999.99"),
        ] {
            let input: Value = serde_json::from_str(body).unwrap();
            let product = validate_create(&input).unwrap();
            assert_eq!(product.price.to_string(), expected, "{body}");
        }
    }

    #[test]
    fn out_of_range_numbers_are_range_violations() {
        for body in [
            r#"{"name":"Widget","price":"1e300"}"#,
            r#"{"name":"Widget","price":1e300}"#,
            r#"{"name":"Widget","price":"12345678901234567890123456789012"}"#,
            r#"{"name":"Widget","price":10000000000}"#,
            r#"{"name":"Widget","price":"-1e300"}"#,
        ] {
            let input: Value = serde_json::from_str(body).unwrap();
            let err = validate_create(&input).unwrap_err();
            assert_eq!(kinds(&err), vec![("price".to_string(), ViolationKind::Range)], "{body}");
        }
    }

    #[test]
    fn malformed_numeric_strings_are_type_violations() {
        for price in ["", "1e", "1.2.3", ".", "1,50", "0x10", "NaN"] {
            let err = validate_create(&json!({ "name": "Widget", "price": price })).unwrap_err();
            assert_eq!(kinds(&err), vec![("price".to_string(), ViolationKind::Type)], "{price:?}");
        }
    }

    #[test]
    fn create_accepts_numeric_price_strings() {
        let product = validate_create(&json!({ "name": "Widget", "price": "19.99" })).unwrap();
        assert_eq!(product.price.to_string(), "19.99");

        let err = validate_create(&json!({ "name": "Widget", "price": "cheap" })).unwrap_err();
        assert_eq!(kinds(&err), vec![("price".to_string(), ViolationKind::Type)]);
    }

    #[test]
    fn create_counts_name_length_in_characters() {
        let name = "é".repeat(NAME_MAX_CHARS);
        assert!(validate_create(&json!({ "name": name, "price": 1 })).is_ok());

        let long = "a".repeat(NAME_MAX_CHARS + 1);
        let err = validate_create(&json!({ "name": long, "price": 1 })).unwrap_err();
        assert_eq!(kinds(&err), vec![("name".to_string(), ViolationKind::Length)]);
    }

    #[test]
    fn create_rejects_non_object_bodies() {
        let err = validate_create(&json!(["Widget", 10])).unwrap_err();
        assert_eq!(kinds(&err), vec![("body".to_string(), ViolationKind::Type)]);
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let err = validate_update(&json!({})).unwrap_err();
        assert_eq!(err.to_string(), NO_FIELDS_MESSAGE);
        assert_eq!(kinds(&err), vec![("body".to_string(), ViolationKind::NoFields)]);
    }

    #[test]
    fn update_with_only_unknown_fields_reports_both() {
        let err = validate_update(&json!({ "colour": "red" })).unwrap_err();
        let found = kinds(&err);
        assert!(found.contains(&("colour".to_string(), ViolationKind::UnknownField)));
        assert!(found.contains(&("body".to_string(), ViolationKind::NoFields)));
    }

    #[test]
    fn update_builds_patch_of_present_fields_only() {
        let patch = validate_update(&json!({ "price": 250.50, "is_active": false })).unwrap();
        assert_eq!(patch.name, None);
        assert_eq!(patch.description, None);
        assert_eq!(patch.price.map(|p| p.to_string()), Some("250.50".to_string()));
        assert_eq!(patch.is_active, Some(false));
    }

    #[test]
    fn update_coerces_boolean_strings_like_numeric_prices() {
        let patch = validate_update(&json!({ "is_active": "true" })).unwrap();
        assert_eq!(patch.is_active, Some(true));

        let patch = validate_update(&json!({ "is_active": "FALSE" })).unwrap();
        assert_eq!(patch.is_active, Some(false));

        let err = validate_update(&json!({ "is_active": 1 })).unwrap_err();
        assert_eq!(kinds(&err), vec![("is_active".to_string(), ViolationKind::Type)]);
    }

    #[test]
    fn update_null_description_clears_it() {
        let patch = validate_update(&json!({ "description": null })).unwrap();
        assert_eq!(patch.description, Some(None));
    }

    #[test]
    fn update_validates_each_present_field() {
        let err = validate_update(&json!({ "name": 12, "price": 0, "is_active": "yes" })).unwrap_err();
        let found = kinds(&err);
        assert_eq!(found.len(), 3);
        assert!(found.contains(&("name".to_string(), ViolationKind::Type)));
        assert!(found.contains(&("price".to_string(), ViolationKind::Range)));
        assert!(found.contains(&("is_active".to_string(), ViolationKind::Type)));
    }

    #[test]
    fn page_defaults_and_parsing() {
        let page = validate_page(None, None).unwrap();
        assert_eq!((page.page(), page.limit()), (1, 10));

        let page = validate_page(Some("2"), Some("5")).unwrap();
        assert_eq!(page.offset(), 5);

        let err = validate_page(Some("two"), Some("-1")).unwrap_err();
        assert_eq!(
            kinds(&err),
            vec![
                ("page".to_string(), ViolationKind::Type),
                ("limit".to_string(), ViolationKind::Range),
            ]
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Any name shorter than the minimum is rejected, whatever the price.
            #[test]
            fn short_names_are_always_rejected(
                name in "[A-Za-z]{0,2}",
                cents in 1i64..1_000_000
            ) {
                let price = Decimal::new(cents, 2);
                let result = validate_create(&json!({ "name": name, "price": price.to_string() }));
                let err = result.unwrap_err();
                prop_assert!(!err.details().is_empty());
            }

            /// Non-positive prices never validate.
            #[test]
            fn non_positive_prices_are_always_rejected(cents in -1_000_000i64..=0) {
                let price = Decimal::new(cents, 2);
                let result = validate_create(&json!({ "name": "Widget", "price": price.to_string() }));
                prop_assert!(result.is_err());
            }

            /// Valid payloads echo their fields and always carry two decimals.
            #[test]
            fn valid_payloads_round_trip_fields(
                name in "[A-Za-z][A-Za-z0-9 ]{2,60}",
                description in proptest::option::of("[a-z ]{0,40}"),
                cents in 1i64..1_000_000_000
            ) {
                let price = Decimal::new(cents, 2);
                let product = validate_create(&json!({
                    "name": name.clone(),
                    "description": description.clone(),
                    "price": price.to_string(),
                })).unwrap();
                prop_assert_eq!(product.name, name);
                prop_assert_eq!(product.description, description);
                prop_assert_eq!(product.price.amount(), price);
                prop_assert_eq!(product.price.amount().scale(), 2);
            }

            /// Three or more significant decimals are a precision violation,
            /// however long the fractional tail and whether sent as text or number.
            #[test]
            fn over_precise_prices_are_rejected(
                units in 1u32..1_000_000,
                zeros in 0usize..40,
                last in 1u32..10,
                as_string in any::<bool>()
            ) {
                let text = format!("{units}.00{}{last}", "0".repeat(zeros));
                let body = if as_string {
                    format!(r#"{{"name":"Widget","price":"{text}"}}"#)
                } else {
                    format!(r#"{{"name":"Widget","price":{text}}}"#)
                };
                let input: Value = serde_json::from_str(&body).unwrap();
                let err = validate_create(&input).unwrap_err();
                prop_assert_eq!(err.details().len(), 1);
                prop_assert_eq!(err.details()[0].kind, ViolationKind::Precision);
            }
        }
    }
}
