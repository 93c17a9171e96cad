//! Search route handlers.
//!
//! The search page is rendered once; everything after that is HTMX fragment
//! traffic against the visitor's [`FilterController`]. Mutation handlers
//! update the controller and immediately return a pending results fragment,
//! which polls `/search/results` until the debounced dispatch settles.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use foodbook_core::{
    ActiveFilters, BrandId, FilterType, NutrientId, NutrientRange, OptionId, SearchProduct,
    SuggestionResult,
    pagination::{self, PageItem},
};

use crate::catalog::CatalogClient;
use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::visitor_id;
use crate::search::{BRAND_FACET_KEY, ControllerView, FilterController, SearchPhase};
use crate::state::AppState;

/// Autocomplete keywords shorter than this are not looked up.
const MIN_SUGGEST_LENGTH: usize = 2;

// ============================================================================
// View models
// ============================================================================

/// One selectable option in a facet panel.
pub struct FacetOptionView {
    pub id: i32,
    pub name: String,
    pub count: u64,
    pub checked: bool,
}

/// One checkbox facet panel.
pub struct FacetView {
    pub key: String,
    pub name: String,
    pub options: Vec<FacetOptionView>,
}

/// One nutrient range slider.
pub struct NutrientSliderView {
    pub id: i32,
    pub name: String,
    pub facet_key: String,
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

/// One indicator in the pager.
pub struct PageLink {
    pub number: u32,
    pub label: String,
    pub current: bool,
    pub is_gap: bool,
}

/// Everything the results fragment needs.
pub struct ResultsView {
    pub is_idle: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub total: u64,
    pub products: Vec<SearchProduct>,
    pub pages: Vec<PageLink>,
    /// Brand scope carried through fragment URLs, if any.
    pub brand: Option<i32>,
}

// ============================================================================
// Templates
// ============================================================================

/// Results fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/results.html")]
pub struct ResultsTemplate {
    pub results: ResultsView,
}

/// Autocomplete suggestions fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/suggestions.html")]
pub struct SuggestionsTemplate {
    pub suggestions: SuggestionResult,
}

/// Full search page.
#[derive(Template, WebTemplate)]
#[template(path = "pages/search.html")]
pub struct SearchPageTemplate {
    pub keyword: String,
    pub facets: Vec<FacetView>,
    pub sliders: Vec<NutrientSliderView>,
    pub has_active_filters: bool,
    /// Brand scope carried into fragment URLs; `None` on the main page.
    pub scope_brand: Option<i32>,
    pub results: ResultsView,
}

// ============================================================================
// Query / form payloads
// ============================================================================

/// Results fragment query parameters.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub brand: Option<i32>,
    #[serde(default)]
    pub retry: bool,
}

/// Search suggestions query parameters.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    /// Accepts `keyword` too so the search box input can be included as-is.
    #[serde(default, alias = "keyword")]
    pub q: String,
    /// Optional locale override; falls back to the default locale when
    /// missing or unsupported.
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordForm {
    #[serde(default)]
    pub keyword: String,
    pub brand: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub key: String,
    pub option: i32,
    pub selected: bool,
    pub brand: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RangeForm {
    pub key: String,
    pub id: i32,
    pub minimal: f64,
    pub maximum: f64,
    pub brand: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ScopeForm {
    pub brand: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PageForm {
    pub page: u32,
    pub brand: Option<i32>,
}

// ============================================================================
// View builders
// ============================================================================

/// Project a controller view into the results fragment model.
///
/// `pending` forces the loading state for the fragment returned straight
/// after a mutation, before the debounced dispatch has fired.
pub fn results_view(view: &ControllerView, brand: Option<i32>, pending: bool) -> ResultsView {
    let (is_idle, error, total, products) = match &view.phase {
        SearchPhase::Idle => (true, None, 0, Vec::new()),
        SearchPhase::Querying => (false, None, 0, Vec::new()),
        SearchPhase::Loaded(result) => (false, None, result.results, result.products.clone()),
        SearchPhase::Errored(message) => (false, Some(message.clone()), 0, Vec::new()),
    };

    ResultsView {
        is_idle: is_idle && !pending,
        is_loading: pending || view.phase.is_querying(),
        error: if pending { None } else { error },
        total,
        products,
        pages: page_links(view.current_page, view.total_pages),
        brand,
    }
}

/// Expand the page window into renderable links.
fn page_links(current: u32, total: u32) -> Vec<PageLink> {
    pagination::page_window(current, total)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) => PageLink {
                number: n,
                label: n.to_string(),
                current: n == current,
                is_gap: false,
            },
            PageItem::Ellipsis => PageLink {
                number: 0,
                label: "\u{2026}".to_owned(),
                current: false,
                is_gap: true,
            },
        })
        .collect()
}

/// Build the facet panels and nutrient sliders for a page render.
///
/// The facet skeleton comes from the filter definitions; option counts are
/// overlaid from the last loaded result when one exists. The synthetic brand
/// facet is filled from the brands endpoint, and is omitted entirely on a
/// brand-scoped page. A definitions or brands fetch failure degrades to an
/// empty panel rather than failing the page.
pub async fn facet_views(
    state: &AppState,
    view: &ControllerView,
    locked_brand: Option<i32>,
) -> (Vec<FacetView>, Vec<NutrientSliderView>) {
    let locale = &state.config().default_locale;

    let definitions = match state.catalog().filter_definitions(locale).await {
        Ok(definitions) => definitions,
        Err(err) => {
            warn!(reason = err.reason(), "failed to fetch filter definitions");
            Vec::new()
        }
    };

    let counts = match &view.phase {
        SearchPhase::Loaded(result) => result.filters.as_slice(),
        _ => &[],
    };

    let mut facets = Vec::new();
    let mut range_key = None;

    for definition in definitions {
        match definition.filter_type {
            FilterType::Range => {
                // Sliders are driven by the controller's nutrient state; the
                // definition only tells us which facet key ranges go under.
                range_key.get_or_insert(definition.key);
            }
            FilterType::Checkbox => {
                if definition.key == BRAND_FACET_KEY && locked_brand.is_some() {
                    continue;
                }

                let mut options = definition.options;
                if definition.key == BRAND_FACET_KEY && options.is_empty() {
                    options = brand_options(state, locale).await;
                }

                let facet_counts = counts.iter().find(|c| c.key == definition.key);
                let mut option_views: Vec<FacetOptionView> = options
                    .into_iter()
                    .map(|option| {
                        let count = facet_counts
                            .and_then(|c| c.options.iter().find(|o| o.id == option.id))
                            .map_or(option.count, |o| o.count);
                        FacetOptionView {
                            id: option.id.as_i32(),
                            name: option.name,
                            count,
                            checked: view.active.contains(&definition.key, option.id),
                        }
                    })
                    .collect();

                // A selected option missing from the current list stays
                // visible, shown by id.
                append_orphan_selections(&mut option_views, &view.active, &definition.key);

                facets.push(FacetView {
                    key: definition.key,
                    name: definition.name,
                    options: option_views,
                });
            }
        }
    }

    let facet_key = range_key.unwrap_or_else(|| "Nutrient".to_owned());
    let sliders = view
        .nutrients
        .iter()
        .map(|nutrient| NutrientSliderView {
            id: nutrient.id.as_i32(),
            name: nutrient.name.clone(),
            facet_key: facet_key.clone(),
            min: nutrient.min_value,
            max: nutrient.max_value,
            current: nutrient.current_value,
        })
        .collect();

    (facets, sliders)
}

async fn brand_options(state: &AppState, locale: &str) -> Vec<foodbook_core::FilterOption> {
    match state.catalog().brands(locale).await {
        Ok(brands) => brands
            .into_iter()
            .map(|brand| foodbook_core::FilterOption {
                id: OptionId::new(brand.id.as_i32()),
                name: brand.name,
                count: brand.count,
            })
            .collect(),
        Err(err) => {
            warn!(reason = err.reason(), "failed to fetch brands");
            Vec::new()
        }
    }
}

fn append_orphan_selections(
    options: &mut Vec<FacetOptionView>,
    active: &ActiveFilters,
    key: &str,
) {
    let Some(selection) = active.get(key) else {
        return;
    };
    for value in &selection.values {
        if !options.iter().any(|o| o.id == value.as_i32()) {
            options.push(FacetOptionView {
                id: value.as_i32(),
                name: format!("{key} {value}"),
                count: 0,
                checked: true,
            });
        }
    }
}

/// The controller serving a request, brand-scoped when a brand id rides
/// along.
fn scoped_controller(
    state: &AppState,
    visitor: &str,
    brand: Option<i32>,
) -> FilterController<CatalogClient> {
    match brand {
        Some(id) => state.brand_controller(visitor, BrandId::new(id)),
        None => state.controller(visitor),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Full search page.
#[instrument(skip(state, session))]
pub async fn search_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let visitor = visitor_id(&session).await?;
    let controller = state.controller(&visitor);
    let view = controller.view();

    let (facets, sliders) = facet_views(&state, &view, None).await;

    Ok(SearchPageTemplate {
        keyword: view.keyword.clone(),
        facets,
        sliders,
        has_active_filters: !view.active.is_empty(),
        scope_brand: None,
        results: results_view(&view, None, false),
    })
}

/// Results fragment, polled by the page while a query is in flight.
#[instrument(skip(state, session))]
pub async fn results_fragment(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse> {
    let visitor = visitor_id(&session).await?;
    let controller = scoped_controller(&state, &visitor, query.brand);

    if query.retry {
        controller.retry();
        return Ok(ResultsTemplate {
            results: results_view(&controller.view(), query.brand, true),
        });
    }

    Ok(ResultsTemplate {
        results: results_view(&controller.view(), query.brand, false),
    })
}

/// Replace the search keyword.
#[instrument(skip(state, session, form), fields(keyword = %form.keyword))]
pub async fn set_keyword(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<KeywordForm>,
) -> Result<impl IntoResponse> {
    let visitor = visitor_id(&session).await?;
    let controller = scoped_controller(&state, &visitor, form.brand);
    controller.set_keyword(&form.keyword);

    Ok(ResultsTemplate {
        results: results_view(&controller.view(), form.brand, true),
    })
}

/// Toggle a checkbox filter option.
#[instrument(skip(state, session, form), fields(key = %form.key, option = form.option))]
pub async fn toggle_filter(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Result<impl IntoResponse> {
    if form.key.trim().is_empty() {
        return Err(AppError::BadRequest("missing filter key".to_owned()));
    }

    let visitor = visitor_id(&session).await?;
    let controller = scoped_controller(&state, &visitor, form.brand);
    controller.toggle_filter_value(&form.key, OptionId::new(form.option), form.selected);

    Ok(ResultsTemplate {
        results: results_view(&controller.view(), form.brand, true),
    })
}

/// Set a nutrient range filter.
#[instrument(skip(state, session, form), fields(key = %form.key, id = form.id))]
pub async fn set_range(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RangeForm>,
) -> Result<impl IntoResponse> {
    if form.minimal > form.maximum {
        return Err(AppError::BadRequest("inverted nutrient range".to_owned()));
    }

    let visitor = visitor_id(&session).await?;
    let controller = scoped_controller(&state, &visitor, form.brand);
    controller.set_range_filter(
        &form.key,
        NutrientRange {
            id: NutrientId::new(form.id),
            minimal: form.minimal,
            maximum: form.maximum,
        },
    );

    Ok(ResultsTemplate {
        results: results_view(&controller.view(), form.brand, true),
    })
}

/// Clear every filter, keeping the keyword.
#[instrument(skip(state, session, form))]
pub async fn reset_filters(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ScopeForm>,
) -> Result<impl IntoResponse> {
    let visitor = visitor_id(&session).await?;
    let controller = scoped_controller(&state, &visitor, form.brand);
    controller.reset_filters();

    Ok(ResultsTemplate {
        results: results_view(&controller.view(), form.brand, true),
    })
}

/// Navigate the pager.
#[instrument(skip(state, session, form), fields(page = form.page))]
pub async fn set_page(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PageForm>,
) -> Result<impl IntoResponse> {
    let visitor = visitor_id(&session).await?;
    let controller = scoped_controller(&state, &visitor, form.brand);
    controller.set_current_page(form.page);

    Ok(ResultsTemplate {
        results: results_view(&controller.view(), form.brand, true),
    })
}

/// Search suggestions endpoint (HTMX).
///
/// Returns an HTML fragment with suggestions grouped by kind. Never fails
/// the request: a catalog error renders an empty fragment.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> impl IntoResponse {
    let keyword = query.q.trim();
    if keyword.chars().count() < MIN_SUGGEST_LENGTH {
        return SuggestionsTemplate {
            suggestions: SuggestionResult::default(),
        };
    }

    let locale = query
        .locale
        .as_deref()
        .filter(|locale| state.config().supports_locale(locale))
        .unwrap_or(&state.config().default_locale);
    if let Some(cached) = state.suggestions().get(keyword, locale) {
        return SuggestionsTemplate {
            suggestions: cached,
        };
    }

    let suggestions = match state.catalog().autocomplete(keyword, locale).await {
        Ok(result) => {
            state.suggestions().set(keyword, locale, result.clone());
            result
        }
        Err(err) => {
            warn!(reason = err.reason(), "autocomplete lookup failed");
            SuggestionResult::default()
        }
    };

    SuggestionsTemplate { suggestions }
}
