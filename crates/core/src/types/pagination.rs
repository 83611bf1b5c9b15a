//! Server-computed pagination block.

use serde::{Deserialize, Serialize};

/// Pagination metadata returned alongside a product page.
///
/// Every field is computed by the backend; the client only asks for a page
/// number and renders what comes back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub has_pre: bool,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Pagination {
    /// Whether a page selector should be shown at all.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.total_pages > 0
    }

    /// Page numbers to render, `1..=total_pages`.
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        1..=self.total_pages
    }

    /// Target of the "previous" link, if the server says there is one.
    #[must_use]
    pub const fn previous(&self) -> Option<u32> {
        if self.has_pre && self.current_page > 1 {
            Some(self.current_page - 1)
        } else {
            None
        }
    }

    /// Target of the "next" link, if the server says there is one.
    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.has_next {
            Some(self.current_page + 1)
        } else {
            None
        }
    }

    /// Whether `page` can be requested given this snapshot.
    #[must_use]
    pub const fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_server_block() {
        let p: Pagination = serde_json::from_str(
            r#"{"total_pages":3,"current_page":2,"has_pre":true,"has_next":true,"category":""}"#,
        )
        .unwrap();
        assert_eq!(p.previous(), Some(1));
        assert_eq!(p.next(), Some(3));
        assert_eq!(p.pages().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_links_follow_server_flags() {
        let first = Pagination {
            total_pages: 2,
            current_page: 1,
            has_pre: false,
            has_next: true,
            category: None,
        };
        assert_eq!(first.previous(), None);
        assert_eq!(first.next(), Some(2));
        assert!(first.contains(2));
        assert!(!first.contains(0));
        assert!(!first.contains(3));
    }

    #[test]
    fn test_empty_block_is_hidden() {
        assert!(!Pagination::default().is_visible());
    }
}
