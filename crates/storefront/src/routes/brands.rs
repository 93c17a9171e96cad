//! Brand page: the search surface scoped to a single brand.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::{instrument, warn};

use foodbook_core::BrandId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::search::{FacetView, NutrientSliderView, ResultsView, facet_views, results_view};
use crate::routes::visitor_id;
use crate::state::AppState;

/// Brand page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/brand.html")]
pub struct BrandPageTemplate {
    pub brand_name: String,
    pub keyword: String,
    pub facets: Vec<FacetView>,
    pub sliders: Vec<NutrientSliderView>,
    pub has_active_filters: bool,
    /// Always `Some`: the brand this page is scoped to.
    pub scope_brand: Option<i32>,
    pub results: ResultsView,
}

/// Brand page. The brand facet is pre-selected and locked; everything else
/// behaves like the main search page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    if id <= 0 {
        return Err(AppError::NotFound(format!("brand {id}")));
    }

    let visitor = visitor_id(&session).await?;
    let controller = state.brand_controller(&visitor, BrandId::new(id));
    let view = controller.view();

    // Heading from the brands list; a brand missing from the current list
    // still gets a page, titled by id.
    let brand_name = match state.catalog().brands(&state.config().default_locale).await {
        Ok(brands) => brands
            .into_iter()
            .find(|b| b.id.as_i32() == id)
            .map_or_else(|| format!("Brand {id}"), |b| b.name),
        Err(err) => {
            warn!(reason = err.reason(), "failed to fetch brands for heading");
            format!("Brand {id}")
        }
    };

    let (facets, sliders) = facet_views(&state, &view, Some(id)).await;

    Ok(BrandPageTemplate {
        brand_name,
        keyword: view.keyword.clone(),
        facets,
        sliders,
        // The locked brand pin always counts as one active selection.
        has_active_filters: view.active.len() > 1,
        scope_brand: Some(id),
        results: results_view(&view, Some(id), false),
    })
}
