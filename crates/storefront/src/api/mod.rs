//! Client for the Fernhouse backend REST API.
//!
//! # Architecture
//!
//! - JSON over HTTP with `reqwest`; every route lives under `/api/v1/`
//! - The backend is the source of truth; the storefront keeps no copies
//!   beyond a short-lived `moka` cache for catalog reads
//! - The customer's token is sent verbatim as the `Authorization` header
//!
//! # Error classes
//!
//! Transport failures ([`ApiError::Http`]) and business rejections
//! ([`ApiError::Rejected`], a `success: false` body) stay distinct so callers
//! can tell "backend unreachable" from "backend said no".
//!
//! # Example
//!
//! ```rust,ignore
//! use fernhouse_storefront::api::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let first_page = client.list_items(CatalogKind::Product, 1).await?;
//! ```

mod account;
mod cache;
mod catalog;
mod payments;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::BackendConfig;

use cache::CacheValue;

pub use account::Registration;
pub use payments::{IDEMPOTENCY_KEY_HEADER, NewOrder};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend answered `success: false`.
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// Non-success HTTP status not covered by a more specific variant.
    #[error("Backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A route could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Message safe to show a customer in a notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) if !message.is_empty() => message.clone(),
            Self::Unauthorized => "Please sign in again.".to_string(),
            Self::NotFound(_) => "That item could not be found.".to_string(),
            Self::RateLimited(_) => "Too many requests, please wait a moment.".to_string(),
            _ => "Something went wrong, please try again.".to_string(),
        }
    }
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone. Catalog reads (lists, counts, details, categories,
/// banners) are cached for the configured TTL.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base: Url,
    cache: Cache<String, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the API URL
    /// cannot be extended with `/api/v1/`.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("fernhouse-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base: api_base(&config.api_url)?,
                cache,
            }),
        })
    }

    /// Absolute URL for a route relative to `/api/v1/`.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base.join(path.trim_start_matches('/'))?)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.post(self.url(path)?))
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Uncached round trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let _: Value = self.execute(self.get("category/get-category")?).await?;
        Ok(())
    }

    /// Send a request and decode its JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        decode_body(status, &path, &response_text)
    }
}

/// Turn a status and body into a typed result.
///
/// Split out of `execute` so the classification can be tested without a
/// server.
fn decode_body<T: DeserializeOwned>(
    status: StatusCode,
    path: &str,
    body: &str,
) -> Result<T, ApiError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => return Err(ApiError::NotFound(path.to_string())),
        _ => {}
    }

    let parsed = serde_json::from_str::<Value>(body);

    if !status.is_success() {
        let message = parsed
            .as_ref()
            .ok()
            .and_then(backend_message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        tracing::error!(
            status = %status,
            path,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(ApiError::Status { status, message });
    }

    let value = parsed.map_err(|e| {
        tracing::error!(
            error = %e,
            path,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })?;

    // Business failures come back as 200 with `success: false`
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = backend_message(&value).unwrap_or_default();
        debug!(path, message = %message, "Backend rejected request");
        return Err(ApiError::Rejected(message));
    }

    Ok(serde_json::from_value(value)?)
}

/// The `message` (or `error`) string of a backend envelope.
fn backend_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `{api_url}/api/v1/`, with exactly one slash between segments.
fn api_base(api_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = api_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/v1/")
}
