//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODBOOK_API_URL` - Base URL of the catalog API
//! - `FOODBOOK_API_KEY` - Catalog API key
//!
//! ## Optional
//! - `FOODBOOK_HOST` - Bind address (default: 127.0.0.1)
//! - `FOODBOOK_PORT` - Listen port (default: 3000)
//! - `FOODBOOK_BASE_URL` - Public URL for the storefront (default: derived from host/port)
//! - `FOODBOOK_DEFAULT_LOCALE` - Catalog culture code (default: nl-NL)
//! - `FOODBOOK_LOCALES` - Comma-separated supported locales (default: the default locale)
//! - `FOODBOOK_DATA_DIR` - Directory for persisted snapshots (default: ./data)
//! - `FOODBOOK_PAGE_SIZE` - Products per result page (default: 21)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct FoodbookConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog API configuration
    pub catalog: CatalogConfig,
    /// Catalog culture code used when no locale is negotiated
    pub default_locale: String,
    /// Supported locales
    pub locales: Vec<String>,
    /// Directory for persisted filter and suggestion snapshots
    pub data_dir: PathBuf,
    /// Products per result page
    pub page_size: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub api_url: String,
    /// API key sent with every catalog request
    pub api_key: SecretString,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl FoodbookConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("FOODBOOK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("FOODBOOK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("FOODBOOK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("FOODBOOK_PORT".to_string(), e.to_string()))?;
        let base_url = get_optional_env("FOODBOOK_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));

        let catalog = CatalogConfig::from_env()?;

        let default_locale = get_env_or_default("FOODBOOK_DEFAULT_LOCALE", "nl-NL");
        let locales = get_optional_env("FOODBOOK_LOCALES").map_or_else(
            || vec![default_locale.clone()],
            |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            },
        );

        let data_dir = PathBuf::from(get_env_or_default("FOODBOOK_DATA_DIR", "./data"));
        let page_size = get_env_or_default("FOODBOOK_PAGE_SIZE", "21")
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "FOODBOOK_PAGE_SIZE".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            catalog,
            default_locale,
            locales,
            data_dir,
            page_size,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether a requested locale is one the storefront serves.
    #[must_use]
    pub fn supports_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }
}

impl CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_required_env("FOODBOOK_API_URL")?;
        // Fail fast on a malformed endpoint rather than on the first search.
        Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FOODBOOK_API_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            api_key: SecretString::from(get_required_env("FOODBOOK_API_KEY")?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
