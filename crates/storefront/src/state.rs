//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::warn;

use foodbook_core::BrandId;

use crate::catalog::CatalogClient;
use crate::config::FoodbookConfig;
use crate::persist::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::search::{FilterController, SuggestionCache};

/// How long an idle visitor's controller is kept around.
const CONTROLLER_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on live controllers across all visitors.
const CONTROLLER_CAPACITY: u64 = 10_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog client and per-visitor controllers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: FoodbookConfig,
    catalog: CatalogClient,
    suggestions: SuggestionCache,
    snapshots: Arc<dyn KeyValueStore>,
    /// One controller per visitor id (plus one per visitor-and-brand scope),
    /// evicted after a period of inactivity.
    controllers: Cache<String, FilterController<CatalogClient>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Falls back to an in-memory snapshot store when the data directory is
    /// not writable; the storefront then simply loses cross-restart
    /// persistence.
    #[must_use]
    pub fn new(config: FoodbookConfig) -> Self {
        let catalog = CatalogClient::new(&config.catalog);

        let snapshots: Arc<dyn KeyValueStore> = match JsonFileStore::new(&config.data_dir) {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(
                    error = %err,
                    dir = %config.data_dir.display(),
                    "data directory unavailable; snapshots will not survive restarts"
                );
                Arc::new(MemoryStore::default())
            }
        };

        let controllers = Cache::builder()
            .max_capacity(CONTROLLER_CAPACITY)
            .time_to_idle(CONTROLLER_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                suggestions: SuggestionCache::new(Arc::clone(&snapshots)),
                snapshots,
                controllers,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &FoodbookConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog API client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the autocomplete suggestion cache.
    #[must_use]
    pub fn suggestions(&self) -> &SuggestionCache {
        &self.inner.suggestions
    }

    /// The search controller for a visitor, created on first use.
    #[must_use]
    pub fn controller(&self, visitor: &str) -> FilterController<CatalogClient> {
        self.inner.controllers.get_with(visitor.to_owned(), || {
            FilterController::new(
                self.inner.catalog.clone(),
                Arc::clone(&self.inner.snapshots),
                self.inner.config.page_size,
            )
        })
    }

    /// The brand-scoped search controller for a visitor, created on first
    /// use. Scoped controllers live alongside the visitor's main controller
    /// under a distinct key.
    #[must_use]
    pub fn brand_controller(
        &self,
        visitor: &str,
        brand: BrandId,
    ) -> FilterController<CatalogClient> {
        let key = format!("{visitor}:brand:{brand}");
        self.inner.controllers.get_with(key, || {
            FilterController::for_brand(
                self.inner.catalog.clone(),
                Arc::clone(&self.inner.snapshots),
                self.inner.config.page_size,
                brand,
            )
        })
    }
}
