use serde::Deserialize;

/// Count of items per page when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u64 = 20;

/// Upper bound on the caller-chosen page size.
pub const MAX_PER_PAGE: u64 = 100;

/// Total page limit.
pub const MAX_PAGES: u64 = 10000;

/// Pagination helper for the [`Query`] extractor on the node and user
/// listings. Pages start at 1; the page size is caller-chosen and clamped.
///
/// [`Query`]: axum::extract::Query
#[derive(Deserialize)]
pub struct Pagination {
    /// Current page value.
    #[serde(default)]
    page: u64,

    /// Requested page size.
    #[serde(default)]
    limit: Option<u64>,
}

impl Pagination {
    /// Get `LIMIT` value for a SQL query.
    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// Get `OFFSET` value for a SQL query.
    pub fn offset(&self) -> u64 {
        self.page.min(MAX_PAGES).saturating_sub(1) * self.limit()
    }
}

#[cfg(test)]
mod tests {
    use super::{Pagination, DEFAULT_PER_PAGE, MAX_PER_PAGE};

    fn pagination(page: u64, limit: Option<u64>) -> Pagination {
        Pagination { page, limit }
    }

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(pagination(0, None).offset(), 0);
        assert_eq!(pagination(1, None).offset(), 0);
        assert_eq!(pagination(2, None).offset(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(pagination(1, Some(0)).limit(), 1);
        assert_eq!(pagination(1, Some(10)).limit(), 10);
        assert_eq!(pagination(1, Some(100000)).limit(), MAX_PER_PAGE);
    }

    #[test]
    fn offset_follows_requested_limit() {
        assert_eq!(pagination(3, Some(10)).offset(), 20);
    }
}
