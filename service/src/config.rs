//! Configuration for the query/formatting layer.
//!
//! Pagination is explicit configuration passed into [`crate::query::RequestQueries`]
//! at construction, not ambient state.

/// Default number of records per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Pagination configuration.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    /// Fixed page size for all listing operations.
    pub page_size: u32,
}

impl PaginationConfig {
    /// Create a pagination configuration with the given page size.
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self { page_size }
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
