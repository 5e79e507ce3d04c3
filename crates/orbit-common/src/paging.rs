//! Paging cursor and page results for CloudControl listing endpoints
//!
//! Listing is complete when a page comes back empty. A short page is not
//! treated as the last one.

use serde::{Deserialize, Serialize};

/// Cursor for a paged listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// 1-based page number
    pub page_number: u32,
    /// Items per page
    pub page_size: u32,
}

impl Paging {
    /// Cursor for the first page
    pub fn first(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size,
        }
    }

    /// Advance to the next page
    pub fn next(&mut self) {
        self.page_number += 1;
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Page number this result answers
    pub page_number: u32,
    /// Page size requested
    pub page_size: u32,
    /// Total count reported by the provider, if any
    #[serde(default)]
    pub total_count: Option<u32>,
}

impl<T> Page<T> {
    /// Build a page for the given cursor
    pub fn new(items: Vec<T>, paging: Paging) -> Self {
        Self {
            items,
            page_number: paging.page_number,
            page_size: paging.page_size,
            total_count: None,
        }
    }

    /// An empty page for the given cursor
    pub fn empty(paging: Paging) -> Self {
        Self::new(Vec::new(), paging)
    }

    /// Check whether the page holds no items (end of listing)
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_starts_at_one() {
        let mut paging = Paging::first(20);
        assert_eq!(paging.page_number, 1);
        assert_eq!(paging.page_size, 20);
        paging.next();
        paging.next();
        assert_eq!(paging.page_number, 3);
    }

    #[test]
    fn test_short_page_is_not_empty() {
        let page = Page::new(vec![1], Paging::first(20));
        assert!(!page.is_empty());
        assert!(Page::<u32>::empty(Paging::first(20)).is_empty());
    }

    #[test]
    fn test_page_deserialization() {
        let json = r#"{"items":["a","b"],"pageNumber":2,"pageSize":2,"totalCount":5}"#;
        let page: Page<String> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.total_count, Some(5));
    }
}
