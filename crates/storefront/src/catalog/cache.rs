//! Cache types for catalog lookup responses.

use foodbook_core::{Brand, FilterDefinition};

/// Cache key for slow-changing catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(super) enum CacheKey {
    Filters { locale: String },
    Brands { locale: String },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub(super) enum CacheValue {
    Filters(Vec<FilterDefinition>),
    Brands(Vec<Brand>),
}
