//! Authentication extractors for admin.
//!
//! The signed-in admin lives in the session under
//! [`keys::CURRENT_ADMIN`](crate::models::keys::CURRENT_ADMIN); it is only
//! ever written after the backend confirmed the admin role.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires admin authentication.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// Session layer is not installed.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => {
                tracing::error!("RequireAdminAuth used on a route without the session layer");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// The admin stored in `session`, if any.
pub async fn current_admin(session: &Session) -> Option<CurrentAdmin> {
    match session.get::<CurrentAdmin>(keys::CURRENT_ADMIN).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable admin session");
            None
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        current_admin(session)
            .await
            .map(Self)
            .ok_or(AdminAuthRejection::RedirectToLogin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use fernhouse_core::UserId;
    use tower_sessions::MemoryStore;

    use super::*;

    fn parts_with(session: Option<Session>) -> Parts {
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    #[tokio::test]
    async fn test_missing_admin_redirects() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut parts = parts_with(Some(session));

        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::RedirectToLogin));
    }

    #[tokio::test]
    async fn test_stored_admin_is_extracted() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let admin = CurrentAdmin {
            id: UserId::new("u1"),
            name: "Ada".to_string(),
            email: "ada@fernhouse.test".to_string(),
            token: "t".to_string(),
        };
        session.insert(keys::CURRENT_ADMIN, &admin).await.unwrap();
        let mut parts = parts_with(Some(session));

        let RequireAdminAuth(found) = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found.id, admin.id);
    }

    #[tokio::test]
    async fn test_missing_session_layer_is_server_error() {
        let mut parts = parts_with(None);
        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
