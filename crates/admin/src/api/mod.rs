//! Client for the back-office routes of the Fernhouse backend.
//!
//! Every call carries the signed-in admin's token as the `Authorization`
//! header. Nothing is cached: admins expect to see their own edits at once.

mod auth;
mod banners;
mod catalog;
mod orders;
pub mod types;
mod users;

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub use banners::BannerDraft;
pub use catalog::{ItemDraft, Upload};
pub use orders::ReturnDecision;

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

    /// Non-success HTTP status.
    #[error("Backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token missing, expired, or not an admin's.
    #[error("Unauthorized")]
    Unauthorized,

    /// A route could not be joined onto the API base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Message safe to show in a notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) if !message.is_empty() => message.clone(),
            Self::Unauthorized => "Your admin session has expired.".to_string(),
            Self::NotFound(_) => "That record no longer exists.".to_string(),
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            _ => "The backend could not complete the request.".to_string(),
        }
    }
}

/// Back-office backend client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: reqwest::Client,
    base: Url,
}

impl AdminClient {
    /// Create a new client for the API at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the URL cannot
    /// be extended with `/api/v1/`.
    pub fn new(api_url: &Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fernhouse-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base = api_url.clone();
        base.set_path(&format!("{}/api/v1/", api_url.path().trim_end_matches('/')));

        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn get(&self, token: &str, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .get(self.url(path)?)
            .header("Authorization", token))
    }

    fn post(&self, token: &str, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .post(self.url(path)?)
            .header("Authorization", token))
    }

    fn put(&self, token: &str, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .put(self.url(path)?)
            .header("Authorization", token))
    }

    fn delete(&self, token: &str, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .client
            .delete(self.url(path)?)
            .header("Authorization", token))
    }

    /// Uncached round trip used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let request = self.client.get(self.url("category/get-category")?);
        let _: Value = self.execute(request).await?;
        Ok(())
    }

    /// Send a request and decode its JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await?;
        decode(status, &path, &body)
    }
}

/// Classify a backend response.
fn decode<T: DeserializeOwned>(status: StatusCode, path: &str, body: &str) -> Result<T, ApiError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ApiError::Unauthorized),
        StatusCode::NOT_FOUND => return Err(ApiError::NotFound(path.to_string())),
        _ => {}
    }

    let value = serde_json::from_str::<Value>(body);

    if !status.is_success() {
        let message = value
            .as_ref()
            .ok()
            .and_then(envelope_message)
            .unwrap_or_default();
        tracing::error!(status = %status, path, "Backend returned non-success status");
        return Err(ApiError::Status { status, message });
    }

    let value = value?;
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = envelope_message(&value).unwrap_or_default();
        debug!(path, message = %message, "Backend rejected request");
        return Err(ApiError::Rejected(message));
    }

    Ok(serde_json::from_value(value)?)
}

fn envelope_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_prefix() {
        let client = AdminClient::new(
            &Url::parse("http://localhost:8080/backend").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.url("/auth/all-users").unwrap().as_str(),
            "http://localhost:8080/backend/api/v1/auth/all-users"
        );
    }

    #[test]
    fn test_decode_rejection_carries_message() {
        let err = decode::<Value>(
            StatusCode::OK,
            "/x",
            r#"{"success":false,"message":"Category exists"}"#,
        )
        .unwrap_err();
        assert_eq!(err.user_message(), "Category exists");
    }

    #[test]
    fn test_decode_status_classes() {
        assert!(matches!(
            decode::<Value>(StatusCode::FORBIDDEN, "/x", ""),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            decode::<Value>(StatusCode::BAD_GATEWAY, "/x", "oops"),
            Err(ApiError::Status { .. })
        ));
        assert!(matches!(
            decode::<Value>(StatusCode::OK, "/x", "not json"),
            Err(ApiError::Parse(_))
        ));
    }
}
