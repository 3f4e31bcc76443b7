//! Page/limit pagination over the active catalog.

use serde::Serialize;

use catalog_core::{DomainError, DomainResult, FieldViolation, ViolationKind};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// A validated page request (1-based page number).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> DomainResult<Self> {
        let mut violations = Vec::new();
        if page < 1 {
            violations.push(FieldViolation::new(
                "page",
                ViolationKind::Range,
                "page must be greater than or equal to 1",
            ));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            violations.push(FieldViolation::new(
                "limit",
                ViolationKind::Range,
                format!("limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
        if !violations.is_empty() {
            return Err(DomainError::invalid_input("invalid pagination parameters", violations));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Pagination metadata echoed back with a listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Count of active rows, independent of limit/offset.
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_derived_from_page_and_limit() {
        assert_eq!(PageRequest::new(1, 10).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(3, 25).unwrap().offset(), 50);
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let page = PageRequest::default();
        assert_eq!((page.page(), page.limit(), page.offset()), (1, 10, 0));
    }

    #[test]
    fn rejects_page_zero_and_out_of_range_limits_together() {
        let err = PageRequest::new(0, 0).unwrap_err();
        let fields: Vec<_> = err.details().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "limit"]);

        assert!(PageRequest::new(1, MAX_LIMIT + 1).is_err());
        assert!(PageRequest::new(1, MAX_LIMIT).is_ok());
    }
}
