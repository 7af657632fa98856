pub mod applications;
pub mod artifacts;
pub mod audit;
pub mod decisions;
pub mod integrations;
pub mod projects;
pub mod refresh_tokens;
pub mod search;
pub mod stats;
pub mod tasks;
pub mod users;

/// Highest page number honoured; larger requests land on this page.
pub const MAX_PAGE: i64 = 1_000_000;

/// LIMIT/OFFSET window for list queries.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Clamp 1-based page numbers and page sizes coming from query strings.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = per_page.unwrap_or(default_per_page).clamp(1, 100);
        Page {
            limit: per_page,
            offset: (page - 1) * per_page,
        }
    }

    /// No window; used by exports.
    pub fn all() -> Self {
        Page {
            limit: i64::MAX,
            offset: 0,
        }
    }

    pub fn number(&self) -> i64 {
        self.offset / self.limit.max(1) + 1
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total as f64 / self.limit.max(1) as f64).ceil() as i64
    }
}

/// `%term%` for ILIKE, with the wildcard characters in `term` escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
