//! Shared Data Transfer Objects (DTOs) for API handlers.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for paginated list requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

impl PageQuery {
    /// Requested page, clamped to at least 1.
    pub fn page(&self) -> u32 {
        match self.page {
            Some(page) if page >= 1 => page,
            _ => DEFAULT_PAGE,
        }
    }

    /// Requested page size: default 25, capped at 100.
    pub fn page_size(&self) -> u32 {
        match self.page_size {
            Some(size) if size >= 1 => size.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Offset of the first row on the requested page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.page_size())
    }

    /// Row limit for the requested page.
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(query: &PageQuery, total: i64, items: Vec<T>) -> Self {
        Self {
            page: query.page(),
            page_size: query.page_size(),
            total,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 25);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_page_query_zero_values_fall_back() {
        let query = PageQuery {
            page: Some(0),
            page_size: Some(0),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 25);
    }

    #[test]
    fn test_page_size_is_capped() {
        let query = PageQuery {
            page: None,
            page_size: Some(500),
        };
        assert_eq!(query.page_size(), 100);
    }

    #[test]
    fn test_offset() {
        let query = PageQuery {
            page: Some(3),
            page_size: Some(10),
        };
        assert_eq!(query.offset(), 20);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_page_query_deserializes_camel_case() {
        let query: PageQuery = serde_json::from_str(r#"{"page": 2, "pageSize": 50}"#).unwrap();
        assert_eq!(query.page(), 2);
        assert_eq!(query.page_size(), 50);
    }

    #[test]
    fn test_page_envelope_serialization() {
        let query = PageQuery {
            page: Some(2),
            page_size: Some(10),
        };
        let page = Page::new(&query, 35, vec!["a", "b"]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page"], 2);
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["total"], 35);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }
}
