//! Admin sign-in against the backend.
//!
//! A login only sticks when the user record carries the admin role and the
//! backend's admin check accepts the token.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use fernhouse_core::{Email, Notice};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::redirect_with_notice;
use crate::api::ApiError;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash::take_notice;
use crate::middleware::auth::{LOGIN_PATH, current_admin};
use crate::models::{CurrentAdmin, keys};
use crate::state::AppState;

// =============================================================================
// Forms and Templates
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Login page query.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set when a backend call rejected the stored token.
    #[serde(default)]
    pub expired: bool,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<Notice>,
}

impl LoginTemplate {
    fn with_error(email: String, error: impl Into<String>) -> Self {
        Self {
            email,
            error: Some(error.into()),
            notice: None,
        }
    }
}

const NOT_AN_ADMIN: &str = "This account does not have admin access";

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
#[instrument(skip(session))]
pub async fn login_page(session: Session, Query(query): Query<LoginQuery>) -> Result<Response> {
    if query.expired {
        session.remove_value(keys::CURRENT_ADMIN).await?;
        clear_sentry_user();
        return Ok(LoginTemplate {
            email: String::new(),
            error: None,
            notice: Some(Notice::info("Your session expired, please sign in again")),
        }
        .into_response());
    }

    if current_admin(&session).await.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(LoginTemplate {
        email: String::new(),
        error: None,
        notice: take_notice(&session).await,
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(LoginTemplate::with_error(form.email, "Enter a valid email address").into_response());
    };

    let login = match state.backend().login(&email, &form.password).await {
        Ok(login) => login,
        Err(ApiError::Unauthorized | ApiError::NotFound(_)) => {
            return Ok(
                LoginTemplate::with_error(form.email, "Invalid email or password").into_response(),
            );
        }
        Err(e @ (ApiError::Rejected(_) | ApiError::Status { .. })) => {
            return Ok(LoginTemplate::with_error(form.email, e.user_message()).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(admin) = CurrentAdmin::from_login(&login) else {
        tracing::warn!("Login by a non-admin account");
        return Ok(LoginTemplate::with_error(form.email, NOT_AN_ADMIN).into_response());
    };

    match state.backend().verify_admin(&admin.token).await {
        Ok(true) => {}
        Ok(false) | Err(ApiError::Unauthorized) => {
            tracing::warn!(admin_id = %admin.id, "Backend refused admin check");
            return Ok(LoginTemplate::with_error(form.email, NOT_AN_ADMIN).into_response());
        }
        Err(e) => return Err(e.into()),
    }

    // Fresh session id on privilege change
    session.cycle_id().await?;
    session.insert(keys::CURRENT_ADMIN, &admin).await?;
    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    let greeting = Notice::success(format!("Welcome back, {}", admin.name));
    Ok(redirect_with_notice(&session, greeting, "/")
        .await?
        .into_response())
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    session.flush().await?;
    clear_sentry_user();
    Ok(Redirect::to(LOGIN_PATH))
}
