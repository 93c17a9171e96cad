//! Session middleware configuration.
//!
//! Sessions carry nothing but the anonymous visitor id, so an in-memory
//! store is enough; losing sessions on restart only means visitors get a
//! fresh id.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::FoodbookConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fb_session";

/// Session expiry time in seconds (30 minutes of inactivity, matching the
/// controller cache).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &FoodbookConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
