use fernhouse_core::{AuthSession, Email};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::instrument;

use super::types::{AdminCheckResponse, LoginResponse};
use super::{AdminClient, ApiError};

impl AdminClient {
    /// Exchange credentials for a `{user, token}` session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] for wrong credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, ApiError> {
        let request = self
            .client
            .post(self.url("auth/login")?)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }));
        let response: LoginResponse = self.execute(request).await?;
        Ok(AuthSession::new(response.user, response.token))
    }

    /// Ask the backend whether `token` belongs to an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a non-admin token is either
    /// `Ok(false)` or [`ApiError::Unauthorized`] depending on the backend.
    #[instrument(skip_all)]
    pub async fn verify_admin(&self, token: &str) -> Result<bool, ApiError> {
        let response: AdminCheckResponse =
            self.execute(self.get(token, "auth/admin-auth")?).await?;
        Ok(response.ok)
    }
}
