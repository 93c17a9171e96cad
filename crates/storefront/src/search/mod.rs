//! Search state: the per-visitor filter controller, the debouncer driving
//! it, and the autocomplete suggestion cache.

pub(crate) mod debounce;

mod controller;
mod suggest;

pub use controller::{
    BRAND_FACET_KEY, ControllerView, FilterController, SEARCH_FAILED_MESSAGE, SearchExecutor,
    SearchPhase,
};
pub use suggest::SuggestionCache;
