//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FERNHOUSE_API_URL` - Base URL of the backend REST API (e.g. `https://api.fernhouse.shop`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CART_SKIP_EMPTY_WRITES` - Leave the persisted cart untouched
//!   when the cart becomes empty (default: false)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::persistence::EmptyCartWrite;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront (used for payment return URLs)
    pub base_url: String,
    /// Backend REST API settings
    pub backend: BackendConfig,
    /// What the cart store does when the cart becomes empty
    pub cart_empty_write: EmptyCartWrite,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking (contains a project key)
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend REST API settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend origin; `/api/v1/` is appended by the client
    pub api_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long catalog reads stay cached
    pub catalog_cache_ttl: Duration,
}

impl BackendConfig {
    /// A config pointing at `api_url` with default timeouts.
    #[must_use]
    pub const fn with_defaults(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl StorefrontConfig {
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

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let backend = BackendConfig::from_env()?;
        let cart_empty_write = if parse_env::<bool>("STOREFRONT_CART_SKIP_EMPTY_WRITES", "false")? {
            EmptyCartWrite::Skip
        } else {
            EmptyCartWrite::Persist
        };
        let log_format = parse_log_format(&get_env_or_default("LOG_FORMAT", "text"))?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            cart_empty_write,
            log_format,
            sentry_dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Where the payment provider sends the customer after paying.
    ///
    /// `{CHECKOUT_SESSION_ID}` is substituted by the provider.
    #[must_use]
    pub fn payment_success_url(&self) -> String {
        format!("{}/payment/success/{{CHECKOUT_SESSION_ID}}", self.base_url)
    }

    /// Where the payment provider sends the customer after cancelling.
    #[must_use]
    pub fn payment_cancel_url(&self) -> String {
        format!("{}/payment/cancel", self.base_url)
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("FERNHOUSE_API_URL")?;
        let api_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("FERNHOUSE_API_URL".to_string(), e.to_string())
        })?;
        let timeout_secs: u64 = parse_env("BACKEND_TIMEOUT_SECS", "10")?;
        let ttl_secs: u64 = parse_env("CATALOG_CACHE_TTL_SECS", "300")?;

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
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

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "text" | "" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar(
            "LOG_FORMAT".to_string(),
            format!("expected `text` or `json`, got `{other}`"),
        )),
    }
}
