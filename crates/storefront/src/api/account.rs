//! Customer authentication and order history.

use fernhouse_core::{AuthSession, Email, Order, OrderId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, Serializer};
use serde_json::json;
use tracing::instrument;

use super::types::{LoginResponse, MessageResponse, OrderListResponse};
use super::{ApiError, BackendClient};

/// New customer account details.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub phone: String,
    pub address: String,
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl BackendClient {
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
        let request = self.post("auth/login")?.json(&json!({
            "email": email,
            "password": password.expose_secret(),
        }));
        let response: LoginResponse = self.execute(request).await?;
        Ok(AuthSession::new(response.user, response.token))
    }

    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the backend refuses the details
    /// (e.g. the email is taken).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .execute(self.post("auth/register")?.json(registration))
            .await?;
        Ok(response.message)
    }

    /// The signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for an expired token.
    #[instrument(skip_all)]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let request = self.get("auth/orders")?.header("Authorization", token);
        let response: OrderListResponse = self.execute(request).await?;
        Ok(response.orders)
    }

    /// Ask for a return on a delivered order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the order is not returnable.
    #[instrument(skip(self, token))]
    pub async fn request_return(
        &self,
        token: &str,
        order: &OrderId,
        reason: &str,
    ) -> Result<String, ApiError> {
        let path = format!("order/return-request/{}", urlencoding::encode(order.as_str()));
        let request = self
            .post(&path)?
            .header("Authorization", token)
            .json(&json!({ "reason": reason }));
        let response: MessageResponse = self.execute(request).await?;
        Ok(response.message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_sends_password_but_hides_it_in_debug() {
        let registration = Registration {
            name: "Ivy".to_string(),
            email: Email::parse("ivy@fern.test").unwrap(),
            password: SecretString::from("hunter22"),
            phone: "555-0101".to_string(),
            address: "1 Greenhouse Way".to_string(),
        };

        let body = serde_json::to_value(&registration).unwrap();
        assert_eq!(body["password"], "hunter22");
        assert!(!format!("{registration:?}").contains("hunter22"));
    }
}
