//! Pagination request and page-result envelope.

use serde::{Deserialize, Serialize};

/// `{"page": 0, "per_page": 20}`. Both default to 0; `per_page = 0` means no limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64) -> Self {
        Pagination { page, per_page }
    }
}

/// One page of rows plus the number of rows matching the query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub count: u64,
}

impl<T> PageResult<T> {
    pub fn empty() -> Self {
        PageResult {
            items: Vec::new(),
            count: 0,
        }
    }
}

impl<T> Default for PageResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_to_zero() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p, Pagination::new(0, 0));
        let p: Pagination = serde_json::from_str(r#"{"page": 2, "per_page": 5}"#).unwrap();
        assert_eq!(p, Pagination::new(2, 5));
    }

    #[test]
    fn page_result_shape() {
        let r = PageResult {
            items: vec![serde_json::json!({"id": 1})],
            count: 7,
        };
        assert_eq!(serde_json::to_value(&r).unwrap(), serde_json::json!({"items": [{"id": 1}], "count": 7}));
        let empty: PageResult<u8> = PageResult::empty();
        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"{"items":[],"count":0}"#);
    }
}
