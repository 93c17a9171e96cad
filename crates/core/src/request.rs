//! Search request composition.
//!
//! Pure: no side effects, no network access. The controller decides whether
//! a composed request is actually worth sending.

use crate::types::facet::ActiveFilters;
use crate::types::search::SearchParams;

impl SearchParams {
    /// Compose the current keyword, active filters and pagination into a
    /// request payload.
    ///
    /// The returned value owns fresh copies of the filter selections, so
    /// later mutation of controller state cannot retroactively change an
    /// in-flight request. An all-empty request (`keyword == ""`, no filters)
    /// is still valid and means "fetch everything, first page".
    #[must_use]
    pub fn compose(keyword: &str, filters: &ActiveFilters, page_index: u32, page_size: u32) -> Self {
        debug_assert!(page_size > 0, "page_size must be positive");
        Self {
            keyword: keyword.to_owned(),
            filters: filters.to_vec(),
            page_index,
            page_size,
        }
    }
}
