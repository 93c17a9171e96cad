//! Session-scoped search state machine.
//!
//! One [`FilterController`] per visitor (or per visitor-and-brand scope)
//! holds the keyword, active filter selections, nutrient sliders and page
//! position, debounces search dispatch, and replaces the result phase
//! atomically when a response lands. Handlers mutate the controller and then
//! render from [`FilterController::view`]; they never talk to the catalog
//! directly.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use foodbook_core::{
    ActiveFilterSelection, ActiveFilters, BrandId, NutrientRange, NutritionalValue, OptionId,
    SearchParams, SearchResult, pagination,
};

use crate::catalog::{CatalogClient, CatalogError};
use crate::persist::KeyValueStore;
use crate::search::debounce::Debouncer;

/// Quiet window before a state change actually hits the catalog.
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Quiet window before the filter snapshot is written out.
const PERSIST_DEBOUNCE: Duration = Duration::from_millis(500);

/// Fixed key for the persisted filter snapshot.
const SNAPSHOT_KEY: &str = "foodbook.filters";

/// Facet key of the synthetic brand facet.
pub const BRAND_FACET_KEY: &str = "Brand";

/// Visitor-facing failure message. Deliberately generic: transport details
/// go to the logs, never to the page.
pub const SEARCH_FAILED_MESSAGE: &str =
    "Something went wrong while searching. Please try again.";

// ============================================================================
// Executor seam
// ============================================================================

/// The one seam between the controller and the catalog.
///
/// Production uses [`CatalogClient`]; tests substitute a stub to script
/// latency and failures.
pub trait SearchExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        params: SearchParams,
    ) -> impl Future<Output = Result<SearchResult, CatalogError>> + Send;
}

impl SearchExecutor for CatalogClient {
    async fn execute(&self, params: SearchParams) -> Result<SearchResult, CatalogError> {
        self.search(&params).await
    }
}

// ============================================================================
// Phase
// ============================================================================

/// Where the controller is in its search lifecycle.
///
/// Exactly one variant at a time; a loaded result and an error can never
/// coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchPhase {
    /// Nothing to search for: no keyword, no filters.
    #[default]
    Idle,
    /// A request is in flight.
    Querying,
    /// The most recent dispatch succeeded.
    Loaded(SearchResult),
    /// The most recent dispatch failed; holds the visitor-facing message.
    Errored(String),
}

impl SearchPhase {
    #[must_use]
    pub const fn is_querying(&self) -> bool {
        matches!(self, Self::Querying)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// What survives across sessions: selections and slider positions. The
/// keyword, page position and results deliberately do not.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterSnapshot {
    #[serde(default)]
    active_filters: Vec<ActiveFilterSelection>,
    #[serde(default)]
    nutritional_values: Vec<NutritionalValue>,
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug, Default)]
struct ControllerState {
    keyword: String,
    active: ActiveFilters,
    nutrients: Vec<NutritionalValue>,
    /// 1-based; page 1 even when there are no results yet.
    current_page: u32,
    total_pages: u32,
    phase: SearchPhase,
    /// Monotonic dispatch sequence; responses carrying an older sequence are
    /// discarded so a slow early response can never overwrite a later one.
    dispatched: u64,
}

/// Read-only projection of the controller for rendering.
#[derive(Debug, Clone)]
pub struct ControllerView {
    pub keyword: String,
    pub active: ActiveFilters,
    pub nutrients: Vec<NutritionalValue>,
    pub current_page: u32,
    pub total_pages: u32,
    pub phase: SearchPhase,
}

struct ControllerInner<E> {
    state: Mutex<ControllerState>,
    executor: E,
    snapshots: Arc<dyn KeyValueStore>,
    search_debounce: Debouncer,
    persist_debounce: Debouncer,
    page_size: u32,
    /// When set, the brand facet is pinned to this brand and visitor toggles
    /// against it are ignored.
    locked_brand: Option<BrandId>,
}

/// Search state controller. Cheaply cloneable; clones share state.
pub struct FilterController<E> {
    inner: Arc<ControllerInner<E>>,
}

impl<E> Clone for FilterController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: SearchExecutor> FilterController<E> {
    /// Create a controller, restoring the persisted filter snapshot if one
    /// exists. A restored selection schedules a search immediately.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(executor: E, snapshots: Arc<dyn KeyValueStore>, page_size: u32) -> Self {
        let controller = Self::build(executor, snapshots, page_size, None);
        controller.restore_snapshot();
        controller
    }

    /// Create a brand-scoped controller with the brand facet pre-selected
    /// and locked. Brand-scoped controllers neither restore nor write the
    /// filter snapshot: a brand page always starts from the brand's full
    /// range, and its pinned selection never bleeds into the main search.
    #[must_use]
    pub fn for_brand(
        executor: E,
        snapshots: Arc<dyn KeyValueStore>,
        page_size: u32,
        brand: BrandId,
    ) -> Self {
        let controller = Self::build(executor, snapshots, page_size, Some(brand));
        {
            let mut state = controller.lock_state();
            state
                .active
                .toggle(BRAND_FACET_KEY, OptionId::new(brand.as_i32()), true);
        }
        controller.schedule_search();
        controller
    }

    fn build(
        executor: E,
        snapshots: Arc<dyn KeyValueStore>,
        page_size: u32,
        locked_brand: Option<BrandId>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(ControllerState {
                    current_page: 1,
                    ..ControllerState::default()
                }),
                executor,
                snapshots,
                search_debounce: Debouncer::new(SEARCH_DEBOUNCE),
                persist_debounce: Debouncer::new(PERSIST_DEBOUNCE),
                page_size,
                locked_brand,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        // A poisoned lock means a panic mid-mutation; the state is still a
        // valid (if stale) snapshot, so keep serving rather than wedging the
        // whole session.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Replace the keyword and return to page 1.
    pub fn set_keyword(&self, keyword: &str) {
        {
            let mut state = self.lock_state();
            state.keyword = keyword.to_owned();
            state.current_page = 1;
        }
        self.schedule_search();
    }

    /// Select or deselect a checkbox option and return to page 1.
    ///
    /// On a brand-scoped controller, toggles against the brand facet are
    /// ignored.
    pub fn toggle_filter_value(&self, key: &str, option: OptionId, selected: bool) {
        if self.inner.locked_brand.is_some() && key == BRAND_FACET_KEY {
            debug!(%option, "ignoring toggle against locked brand facet");
            return;
        }
        {
            let mut state = self.lock_state();
            state.active.toggle(key, option, selected);
            state.current_page = 1;
        }
        self.schedule_search();
        self.schedule_persist();
    }

    /// Set a nutrient range and return to page 1. Also moves the matching
    /// slider so the view reflects the restriction.
    pub fn set_range_filter(&self, key: &str, range: NutrientRange) {
        {
            let mut state = self.lock_state();
            if let Some(nutrient) = state.nutrients.iter_mut().find(|n| n.id == range.id) {
                nutrient.current_value = range.maximum;
            }
            state.active.set_range(key, range);
            state.current_page = 1;
        }
        self.schedule_search();
        self.schedule_persist();
    }

    /// Navigate to a page. Out-of-bounds targets are ignored.
    pub fn set_current_page(&self, page: u32) {
        {
            let mut state = self.lock_state();
            if !pagination::page_in_bounds(page, state.total_pages) {
                debug!(page, total = state.total_pages, "ignoring out-of-bounds page");
                return;
            }
            state.current_page = page;
        }
        self.schedule_search();
    }

    /// Clear every filter and slider and return to page 1. The keyword is
    /// left alone: resetting filters is not resetting the search. On a
    /// brand-scoped controller the brand selection survives the reset.
    pub fn reset_filters(&self) {
        {
            let mut state = self.lock_state();
            state.active.clear();
            if let Some(brand) = self.inner.locked_brand {
                state
                    .active
                    .toggle(BRAND_FACET_KEY, OptionId::new(brand.as_i32()), true);
            }
            for nutrient in &mut state.nutrients {
                nutrient.reset();
            }
            state.current_page = 1;
        }
        self.schedule_search();
        self.schedule_persist();
    }

    /// Re-dispatch the current query, typically after an error.
    pub fn retry(&self) {
        self.schedule_search();
    }

    /// Snapshot the state for rendering.
    #[must_use]
    pub fn view(&self) -> ControllerView {
        let state = self.lock_state();
        ControllerView {
            keyword: state.keyword.clone(),
            active: state.active.clone(),
            nutrients: state.nutrients.clone(),
            current_page: state.current_page,
            total_pages: state.total_pages,
            phase: state.phase.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn schedule_search(&self) {
        let controller = self.clone();
        self.inner.search_debounce.schedule(move || async move {
            controller.dispatch_search().await;
        });
    }

    fn schedule_persist(&self) {
        // The snapshot belongs to the main search page; brand-scoped
        // controllers never write it.
        if self.inner.locked_brand.is_some() {
            return;
        }
        let controller = self.clone();
        self.inner.persist_debounce.schedule(move || async move {
            controller.persist_snapshot();
        });
    }

    async fn dispatch_search(&self) {
        let (params, sequence) = {
            let mut state = self.lock_state();
            if state.keyword.trim().is_empty() && state.active.is_empty() {
                // Nothing to ask for; an empty query never hits the network.
                state.phase = SearchPhase::Idle;
                state.total_pages = 0;
                return;
            }
            state.dispatched += 1;
            state.phase = SearchPhase::Querying;
            let params = SearchParams::compose(
                &state.keyword,
                &state.active,
                state.current_page.saturating_sub(1),
                self.inner.page_size,
            );
            (params, state.dispatched)
        };

        let outcome = self.inner.executor.execute(params).await;

        let mut state = self.lock_state();
        if state.dispatched != sequence {
            debug!(sequence, latest = state.dispatched, "discarding superseded search response");
            return;
        }

        match outcome {
            Ok(result) => {
                state.total_pages = pagination::total_pages(result.results, self.inner.page_size);
                if state.nutrients.is_empty() {
                    state.nutrients = result
                        .nutrient_bounds
                        .iter()
                        .map(|b| {
                            NutritionalValue::unrestricted(
                                b.id,
                                b.name.clone(),
                                b.min_value,
                                b.max_value,
                            )
                        })
                        .collect();
                }
                state.phase = SearchPhase::Loaded(result);
            }
            Err(err) => {
                warn!(reason = err.reason(), error = %err, "search dispatch failed");
                state.total_pages = 0;
                state.phase = SearchPhase::Errored(SEARCH_FAILED_MESSAGE.to_owned());
            }
        }
    }

    // ------------------------------------------------------------------
    // Snapshot persistence
    // ------------------------------------------------------------------

    fn persist_snapshot(&self) {
        let snapshot = {
            let state = self.lock_state();
            FilterSnapshot {
                active_filters: state.active.to_vec(),
                nutritional_values: state.nutrients.clone(),
            }
        };

        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(err) = self.inner.snapshots.write(SNAPSHOT_KEY, &json) {
                    debug!(error = %err, "failed to persist filter snapshot");
                }
            }
            Err(err) => debug!(error = %err, "failed to encode filter snapshot"),
        }
    }

    fn restore_snapshot(&self) {
        let Some(json) = self.inner.snapshots.read(SNAPSHOT_KEY) else {
            return;
        };
        let Ok(snapshot) = serde_json::from_str::<FilterSnapshot>(&json) else {
            debug!("discarding undecodable filter snapshot");
            self.inner.snapshots.remove(SNAPSHOT_KEY);
            return;
        };

        let restored = ActiveFilters::from_selections(snapshot.active_filters);
        if restored.is_empty() {
            return;
        }

        {
            let mut state = self.lock_state();
            state.active = restored;
            state.nutrients = snapshot.nutritional_values;
        }
        self.schedule_search();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use foodbook_core::{NutrientBounds, NutrientId, ProductId, SearchProduct};

    use crate::persist::MemoryStore;

    /// Scripted executor: each call pops the next `(latency, outcome)` entry;
    /// once the script runs dry, calls succeed instantly with the default
    /// result.
    struct StubExecutor {
        calls: Arc<StdMutex<Vec<SearchParams>>>,
        script: StdMutex<VecDeque<(Duration, Result<SearchResult, CatalogError>)>>,
        default_result: SearchResult,
    }

    impl StubExecutor {
        fn new(default_result: SearchResult) -> (Self, Arc<StdMutex<Vec<SearchParams>>>) {
            let calls = Arc::new(StdMutex::new(Vec::new()));
            (
                Self {
                    calls: Arc::clone(&calls),
                    script: StdMutex::new(VecDeque::new()),
                    default_result,
                },
                calls,
            )
        }

        fn push(&self, delay: Duration, outcome: Result<SearchResult, CatalogError>) {
            self.script.lock().unwrap().push_back((delay, outcome));
        }
    }

    impl SearchExecutor for StubExecutor {
        async fn execute(&self, params: SearchParams) -> Result<SearchResult, CatalogError> {
            self.calls.lock().unwrap().push(params);
            let scripted = self.script.lock().unwrap().pop_front();
            match scripted {
                Some((delay, outcome)) => {
                    tokio::time::sleep(delay).await;
                    outcome
                }
                None => Ok(self.default_result.clone()),
            }
        }
    }

    fn result_with(results: u64) -> SearchResult {
        SearchResult {
            results,
            products: vec![SearchProduct {
                id: ProductId::new(1),
                name: "Goudse kaas".to_owned(),
                slug: "goudse-kaas".to_owned(),
                brand: None,
                image_url: None,
            }],
            filters: Vec::new(),
            nutrient_bounds: Vec::new(),
        }
    }

    fn controller_with(
        default_result: SearchResult,
    ) -> (
        FilterController<StubExecutor>,
        Arc<StdMutex<Vec<SearchParams>>>,
    ) {
        let (executor, calls) = StubExecutor::new(default_result);
        let controller =
            FilterController::new(executor, Arc::new(MemoryStore::default()), 21);
        (controller, calls)
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_mutations_dispatches_once() {
        let (controller, calls) = controller_with(result_with(42));

        controller.set_keyword("kaas");
        controller.toggle_filter_value("Category", OptionId::new(1), true);
        controller.toggle_filter_value("Category", OptionId::new(2), true);

        settle(400).await;
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(matches!(controller.view().phase, SearchPhase::Loaded(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_returns_to_first_page() {
        let (controller, calls) = controller_with(result_with(210)); // 10 pages

        controller.set_keyword("kaas");
        settle(400).await;
        controller.set_current_page(4);
        settle(400).await;
        assert_eq!(controller.view().current_page, 4);

        controller.toggle_filter_value("Category", OptionId::new(1), true);
        settle(400).await;

        let view = controller.view();
        assert_eq!(view.current_page, 1);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.last().unwrap().page_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_navigation_requests_zero_based_index() {
        let (controller, calls) = controller_with(result_with(210));

        controller.set_keyword("kaas");
        settle(400).await;
        controller.set_current_page(3);
        settle(400).await;

        assert_eq!(calls.lock().unwrap().last().unwrap().page_index, 2);
        assert_eq!(controller.view().current_page, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_bounds_page_is_ignored() {
        let (controller, calls) = controller_with(result_with(42)); // 2 pages

        controller.set_keyword("kaas");
        settle(400).await;

        controller.set_current_page(99);
        controller.set_current_page(0);
        settle(400).await;

        assert_eq!(controller.view().current_page, 1);
        // Only the initial keyword dispatch went out.
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_query_goes_idle_without_network() {
        let (controller, calls) = controller_with(result_with(1));

        controller.set_keyword("   ");
        settle(400).await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(controller.view().phase, SearchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_filters_but_keeps_keyword() {
        let mut result = result_with(210);
        result.nutrient_bounds = vec![NutrientBounds {
            id: NutrientId::new(7),
            name: "Zout".to_owned(),
            min_value: 0.0,
            max_value: 25.0,
        }];
        let (controller, calls) = controller_with(result);

        controller.set_keyword("kaas");
        controller.toggle_filter_value("Category", OptionId::new(1), true);
        settle(400).await;
        controller.set_range_filter(
            "Nutrient",
            NutrientRange {
                id: NutrientId::new(7),
                minimal: 0.0,
                maximum: 8.0,
            },
        );
        settle(400).await;
        controller.set_current_page(5);
        settle(400).await;
        assert!(controller.view().nutrients[0].is_restricted());

        controller.reset_filters();
        settle(400).await;

        let view = controller.view();
        assert_eq!(view.keyword, "kaas");
        assert!(view.active.is_empty());
        assert_eq!(view.current_page, 1);
        // Every slider is back at its full range.
        assert!(view.nutrients.iter().all(|n| !n.is_restricted()));
        assert!((view.nutrients[0].current_value - 25.0).abs() < f64::EPSILON);

        let calls = calls.lock().unwrap();
        let last = calls.last().unwrap();
        assert_eq!(last.keyword, "kaas");
        assert!(last.filters.is_empty());
        assert_eq!(last.page_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_filter_state_and_shows_generic_message() {
        let (executor, _calls) = StubExecutor::new(result_with(42));
        executor.push(
            Duration::ZERO,
            Err(CatalogError::Server { status: 502 }),
        );
        let controller = FilterController::new(executor, Arc::new(MemoryStore::default()), 21);

        controller.set_keyword("kaas");
        controller.toggle_filter_value("Category", OptionId::new(1), true);
        settle(400).await;

        let view = controller.view();
        assert_eq!(
            view.phase,
            SearchPhase::Errored(SEARCH_FAILED_MESSAGE.to_owned())
        );
        // The failure did not eat the visitor's selections.
        assert_eq!(view.keyword, "kaas");
        assert!(view.active.contains("Category", OptionId::new(1)));

        // Retry with a healthy backend recovers.
        controller.retry();
        settle(400).await;
        assert!(matches!(controller.view().phase, SearchPhase::Loaded(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_early_response_cannot_overwrite_later_one() {
        let (executor, calls) = StubExecutor::new(result_with(42));
        // First dispatch is slow, second is instant.
        executor.push(Duration::from_millis(10_000), Ok(result_with(1)));
        executor.push(Duration::ZERO, Ok(result_with(2)));
        let controller = FilterController::new(executor, Arc::new(MemoryStore::default()), 21);

        controller.set_keyword("ka");
        settle(400).await;
        controller.set_keyword("kaas");
        settle(400).await;

        // The fast second response is in.
        match controller.view().phase {
            SearchPhase::Loaded(ref result) => assert_eq!(result.results, 2),
            ref other => panic!("expected loaded phase, got {other:?}"),
        }

        // Let the slow first response land; it must be discarded.
        settle(10_000).await;
        match controller.view().phase {
            SearchPhase::Loaded(ref result) => assert_eq!(result.results, 2),
            ref other => panic!("expected loaded phase, got {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nutrient_sliders_initialized_from_first_result() {
        let mut result = result_with(5);
        result.nutrient_bounds = vec![NutrientBounds {
            id: NutrientId::new(7),
            name: "Zout".to_owned(),
            min_value: 0.0,
            max_value: 25.0,
        }];
        let (controller, _calls) = controller_with(result);

        controller.set_keyword("kaas");
        settle(400).await;

        let view = controller.view();
        assert_eq!(view.nutrients.len(), 1);
        assert!(!view.nutrients[0].is_restricted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_filter_moves_slider() {
        let mut result = result_with(5);
        result.nutrient_bounds = vec![NutrientBounds {
            id: NutrientId::new(7),
            name: "Zout".to_owned(),
            min_value: 0.0,
            max_value: 25.0,
        }];
        let (controller, calls) = controller_with(result);

        controller.set_keyword("kaas");
        settle(400).await;

        controller.set_range_filter(
            "Nutrient",
            NutrientRange {
                id: NutrientId::new(7),
                minimal: 0.0,
                maximum: 8.0,
            },
        );
        settle(400).await;

        let view = controller.view();
        assert!(view.nutrients[0].is_restricted());
        assert!((view.nutrients[0].current_value - 8.0).abs() < f64::EPSILON);

        let calls = calls.lock().unwrap();
        let last = calls.last().unwrap();
        assert_eq!(last.filters.len(), 1);
        assert_eq!(last.filters[0].item_between.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_brand_scope_locks_brand_facet() {
        let (executor, calls) = StubExecutor::new(result_with(42));
        let controller = FilterController::for_brand(
            executor,
            Arc::new(MemoryStore::default()),
            21,
            BrandId::new(9),
        );
        settle(400).await;

        // The brand selection was dispatched.
        {
            let calls = calls.lock().unwrap();
            let first = calls.first().unwrap();
            assert!(
                first
                    .filters
                    .iter()
                    .any(|s| s.key == BRAND_FACET_KEY && s.values == vec![OptionId::new(9)])
            );
        }

        // Deselecting the locked brand is a no-op.
        controller.toggle_filter_value(BRAND_FACET_KEY, OptionId::new(9), false);
        settle(400).await;
        assert!(controller.view().active.contains(BRAND_FACET_KEY, OptionId::new(9)));

        // Other facets still work within the scope.
        controller.toggle_filter_value("Category", OptionId::new(3), true);
        settle(400).await;
        assert!(controller.view().active.contains("Category", OptionId::new(3)));

        // Reset drops the extra facet but keeps the brand pin.
        controller.reset_filters();
        settle(400).await;
        let view = controller.view();
        assert!(view.active.contains(BRAND_FACET_KEY, OptionId::new(9)));
        assert!(!view.active.contains("Category", OptionId::new(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_brand_page_never_writes_the_shared_snapshot() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());

        {
            let (executor, _calls) = StubExecutor::new(result_with(42));
            let controller =
                FilterController::for_brand(executor, store.clone(), 21, BrandId::new(9));
            controller.toggle_filter_value("Category", OptionId::new(3), true);
            settle(600).await; // past the persist window
        }

        assert!(store.read(SNAPSHOT_KEY).is_none());

        // A fresh main-page controller on the same store starts clean: no
        // pinned brand, no brand-page selections.
        let (executor, calls) = StubExecutor::new(result_with(42));
        let main = FilterController::new(executor, store, 21);
        settle(400).await;
        assert!(main.view().active.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_survives_controller_rebuild() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());

        {
            let (executor, _calls) = StubExecutor::new(result_with(42));
            let controller = FilterController::new(executor, store.clone(), 21);
            controller.set_keyword("kaas");
            controller.toggle_filter_value("Category", OptionId::new(1), true);
            settle(600).await; // past the persist window
        }

        let (executor, calls) = StubExecutor::new(result_with(42));
        let controller = FilterController::new(executor, store, 21);
        settle(400).await;

        let view = controller.view();
        assert!(view.active.contains("Category", OptionId::new(1)));
        // Restored filters re-dispatch without any visitor action, but the
        // keyword does not come back.
        assert_eq!(view.keyword, "");
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_snapshot_is_discarded() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());
        store.write(SNAPSHOT_KEY, "not json").unwrap();

        let (executor, calls) = StubExecutor::new(result_with(42));
        let controller = FilterController::new(executor, store.clone(), 21);
        settle(400).await;

        assert!(controller.view().active.is_empty());
        assert!(calls.lock().unwrap().is_empty());
        assert!(store.read(SNAPSHOT_KEY).is_none());
    }
}
