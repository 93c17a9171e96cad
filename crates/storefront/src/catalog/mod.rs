//! Catalog API client.
//!
//! Thin async wrapper around the product catalog's HTTP endpoints:
//! search, autocomplete, filter definitions and brands. Search is executed
//! at-most-once per call - no caching, no retries; retry policy belongs to
//! the caller. Slow-changing lookups (filter definitions, brands) are cached
//! via `moka` (5-minute TTL).

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use foodbook_core::{Brand, FilterDefinition, SearchParams, SearchResult, SuggestionResult};

use crate::config::CatalogConfig;
use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Transport-level failure: the endpoint was unreachable.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered 2xx with no body. Distinct from a zero-result
    /// success, which is a valid payload with `results: 0`.
    #[error("catalog returned an empty body")]
    EmptyResponse,

    /// The endpoint answered with a non-success status.
    #[error("catalog returned HTTP {status}")]
    Server { status: u16 },

    /// The body could not be decoded.
    #[error("malformed catalog response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogError {
    /// Coarse failure class, mirrored in logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::EmptyResponse => "empty-response",
            Self::Server { .. } | Self::Parse(_) => "server-error",
        }
    }
}

/// Client for the catalog API.
///
/// Cheaply cloneable; all clones share one HTTP connection pool and one
/// lookup cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog API client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.trim_end_matches('/').to_owned(),
                api_key: config.api_key.expose_secret().to_owned(),
                cache,
            }),
        }
    }

    /// Execute one search request.
    ///
    /// # Errors
    ///
    /// Fails with [`CatalogError`] on transport errors, non-success statuses,
    /// empty bodies and undecodable payloads. Never panics and never caches:
    /// a search is delivered at most once.
    #[instrument(skip(self, params), fields(keyword = %params.keyword, page = params.page_index))]
    pub async fn search(&self, params: &SearchParams) -> Result<SearchResult, CatalogError> {
        let url = format!("{}/search", self.inner.base_url);

        let response = self
            .inner
            .client
            .post(&url)
            .header("Api-Key", &self.inner.api_key)
            .json(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "catalog search returned non-success status"
            );
            return Err(CatalogError::Server {
                status: status.as_u16(),
            });
        }

        if body.trim().is_empty() {
            return Err(CatalogError::EmptyResponse);
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch autocomplete suggestions for a keyword.
    ///
    /// Uncached here; the [`SuggestionCache`](crate::search::SuggestionCache)
    /// sits in front of this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is invalid.
    #[instrument(skip(self))]
    pub async fn autocomplete(
        &self,
        keyword: &str,
        locale: &str,
    ) -> Result<SuggestionResult, CatalogError> {
        let url = format!("{}/autocomplete", self.inner.base_url);
        self.get_json(&url, &[("keyword", keyword), ("culture", locale)])
            .await
    }

    /// Filter definitions for the current catalog.
    ///
    /// Assumed slow-changing; cached for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is invalid.
    #[instrument(skip(self))]
    pub async fn filter_definitions(
        &self,
        locale: &str,
    ) -> Result<Vec<FilterDefinition>, CatalogError> {
        let key = CacheKey::Filters {
            locale: locale.to_owned(),
        };
        if let Some(CacheValue::Filters(definitions)) = self.inner.cache.get(&key).await {
            debug!("cache hit for filter definitions");
            return Ok(definitions);
        }

        let url = format!("{}/filters", self.inner.base_url);
        let definitions: Vec<FilterDefinition> =
            self.get_json(&url, &[("culture", locale)]).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Filters(definitions.clone()))
            .await;

        Ok(definitions)
    }

    /// Brands in the current catalog, used to enrich the synthetic Brand
    /// facet with names and counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is invalid.
    #[instrument(skip(self))]
    pub async fn brands(&self, locale: &str) -> Result<Vec<Brand>, CatalogError> {
        let key = CacheKey::Brands {
            locale: locale.to_owned(),
        };
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&key).await {
            debug!("cache hit for brands");
            return Ok(brands);
        }

        let url = format!("{}/brands", self.inner.base_url);
        let brands: Vec<Brand> = self.get_json(&url, &[("culture", locale)]).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Brands(brands.clone()))
            .await;

        Ok(brands)
    }

    /// Issue a GET request and decode the JSON body, with the same empty-body
    /// and status handling as `search`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let response = self
            .inner
            .client
            .get(url)
            .query(query)
            .header("Api-Key", &self.inner.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                "catalog returned non-success status"
            );
            return Err(CatalogError::Server {
                status: status.as_u16(),
            });
        }

        if body.trim().is_empty() {
            return Err(CatalogError::EmptyResponse);
        }

        Ok(serde_json::from_str(&body)?)
    }
}
