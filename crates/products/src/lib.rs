//! Products domain module.
//!
//! This crate contains the product catalog's data model and input validation,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod pagination;
pub mod product;
pub mod validation;

pub use pagination::{PageMeta, PageRequest};
pub use product::{NewProduct, Price, PriceError, Product, ProductPatch};
pub use validation::{validate_create, validate_page, validate_update};
