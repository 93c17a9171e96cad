//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /search
//! GET  /health                 - Health check
//!
//! # Search (HTMX fragments except the page itself)
//! GET  /search                 - Search page
//! GET  /search/results         - Results fragment (polled while a query is in flight)
//! GET  /search/suggest         - Autocomplete suggestions fragment
//! POST /search/keyword         - Replace the keyword (returns results fragment)
//! POST /search/filters         - Toggle a checkbox option (returns results fragment)
//! POST /search/filters/range   - Set a nutrient range (returns results fragment)
//! POST /search/filters/reset   - Clear all filters (returns results fragment)
//! POST /search/page            - Navigate the pager (returns results fragment)
//!
//! # Brands
//! GET  /brands/{id}            - Brand page: the search surface scoped to one brand
//! ```

pub mod brands;
pub mod search;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;

/// Session key holding the anonymous visitor id.
const SESSION_VISITOR_KEY: &str = "visitor_id";

/// The visitor id for this session, minted on first contact.
async fn visitor_id(session: &Session) -> Result<String> {
    if let Some(id) = session.get::<String>(SESSION_VISITOR_KEY).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    session.insert(SESSION_VISITOR_KEY, id.clone()).await?;
    Ok(id)
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::search_page))
        .route("/results", get(search::results_fragment))
        .route("/suggest", get(search::suggest))
        .route("/keyword", post(search::set_keyword))
        .route("/filters", post(search::toggle_filter))
        .route("/filters/range", post(search::set_range))
        .route("/filters/reset", post(search::reset_filters))
        .route("/page", post(search::set_page))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::permanent("/search") }))
        .nest("/search", search_routes())
        .route("/brands/{id}", get(brands::show))
}
