//! Pagination helpers

/// LIMIT/OFFSET for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    /// Pages start at 1; out of range values are clamped
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Saturates at `i64::MAX`, so a far-out page is empty rather than an error
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of results plus the total across all pages
#[derive(Debug, Clone)]
pub struct Paginator<M> {
    rows: Vec<M>,
    total: i64,
    pagination: Pagination,
}

impl<M> Paginator<M> {
    pub fn new(rows: Vec<M>, total: i64, pagination: Pagination) -> Self {
        Self {
            rows,
            total,
            pagination,
        }
    }

    pub fn all(&self) -> &[M] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<M> {
        self.rows
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn per_page(&self) -> i64 {
        self.pagination.per_page
    }

    pub fn current_page(&self) -> i64 {
        self.pagination.page
    }

    pub fn last_page(&self) -> i64 {
        let per_page = self.pagination.per_page;
        let partial = i64::from(self.total % per_page != 0);
        (self.total / per_page + partial).max(1)
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page() < self.last_page()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
