//! The Registry's pagination envelope.

use serde::{Deserialize, Serialize};

use crate::filter::PAGE_SIZE;
use crate::voter::Voter;

/// Server-computed description of the current result window.
///
/// Read-only display data: the client never derives `total` or `pages`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    /// "Previous" is enabled everywhere except page 1.
    pub fn has_previous(&self, page: u32) -> bool {
        page > 1
    }

    /// "Next" is disabled once `page >= pages`.
    pub fn has_next(&self, page: u32) -> bool {
        page < self.pages
    }

    /// Whether pagination controls are shown at all.
    pub fn is_paged(&self) -> bool {
        self.pages > 1
    }

    pub fn label(&self, page: u32) -> String {
        format!("Page {page} of {}", self.pages)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PAGE_SIZE,
            total: 0,
            pages: 0,
        }
    }
}

/// Body of both `GET /api/voters` and `GET /api/voters/search`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotersPage {
    #[serde(default)]
    pub voters: Vec<Voter>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_rules() {
        let p = Pagination {
            page: 1,
            limit: 20,
            total: 45,
            pages: 3,
        };
        assert!(!p.has_previous(1));
        assert!(p.has_next(1));
        assert!(p.has_previous(3));
        assert!(!p.has_next(3));
        assert_eq!(p.label(2), "Page 2 of 3");
    }

    #[test]
    fn empty_result_disables_next() {
        let p = Pagination::default();
        assert!(!p.has_next(1));
        assert!(!p.is_paged());
    }

    #[test]
    fn deserializes_page_body() {
        let json = r#"{"voters": [], "pagination": {"page": 2, "limit": 20, "total": 45, "pages": 3}}"#;
        let page: VotersPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.pagination.pages, 3);
        assert!(page.voters.is_empty());
    }
}
