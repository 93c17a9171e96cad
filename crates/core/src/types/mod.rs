//! Core types for Foodbook.
//!
//! This module provides the facet model and the search wire shapes.

pub mod facet;
pub mod id;
pub mod search;

pub use facet::{
    ActiveFilterSelection, ActiveFilters, FilterDefinition, FilterOption, FilterType,
    NutrientRange, NutritionalValue,
};
pub use id::*;
pub use search::{
    Brand, FacetCounts, NutrientBounds, SearchParams, SearchProduct, SearchResult, Suggestion,
    SuggestionResult,
};
