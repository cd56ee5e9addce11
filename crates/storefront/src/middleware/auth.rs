//! Authentication extractors.
//!
//! Read the persisted `{user, token}` for pages that need a signed-in
//! customer.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use fernhouse_core::AuthSession;
use tower_sessions::Session;

use crate::persistence::{SessionStorage, load_auth};

/// Extractor that requires a signed-in customer.
///
/// If nobody is signed in, redirects to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user_name().unwrap_or("there"))
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Error returned when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// No session layer on this route.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::MissingSession => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RequireAuth used outside its provider: session layer is not installed",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;

        let auth = load_auth(&SessionStorage::new(session)).await;
        if auth.is_authenticated() {
            Ok(Self(auth))
        } else {
            Err(AuthRejection::RedirectToLogin)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, header};

    use super::*;

    #[tokio::test]
    async fn test_missing_session_layer_is_a_server_error() {
        let (mut parts, ()) = Request::builder().uri("/orders").body(()).unwrap().into_parts();

        let rejection = RequireAuth::from_request_parts(&mut parts, &()).await.err().unwrap();

        assert_eq!(
            rejection.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_signed_out_redirects_to_login() {
        let response = AuthRejection::RedirectToLogin.into_response();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/auth/login");
    }
}
