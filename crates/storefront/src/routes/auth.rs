//! Authentication route handlers.
//!
//! Login and registration go straight to the backend. A successful login
//! stores `{user, token}` under the session's `user` key; logout removes it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use fernhouse_core::{Email, Notice};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::redirect_with_notice;
use crate::api::Registration;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::persistence::{forget_auth, save_auth};
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};
use crate::views::Layout;

/// Shortest password the register form accepts.
const MIN_PASSWORD_LENGTH: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn with_error(layout: Layout, form: &RegisterForm, error: impl Into<String>) -> Self {
        Self {
            layout,
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(cart: CartStore, auth: AuthStore) -> Response {
    if auth.is_authenticated() {
        return Redirect::to("/account").into_response();
    }

    LoginTemplate {
        layout: Layout::load(&cart, &auth).await,
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, cart, auth, form))]
pub async fn login(
    State(state): State<AppState>,
    cart: CartStore,
    mut auth: AuthStore,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rerender = |layout: Layout, error: String| LoginTemplate {
        layout,
        email: form.email.clone(),
        error: Some(error),
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            let layout = Layout::load(&cart, &auth).await;
            return Ok(rerender(layout, e.to_string()).into_response());
        }
    };

    match state.backend().login(&email, &form.password).await {
        Ok(session) => {
            save_auth(auth.storage(), &session).await?;
            if let Some(id) = session.user_id() {
                set_sentry_user(&id, session.user_email());
            }
            info!("Customer signed in");

            let greeting = session
                .user_name()
                .map_or_else(|| "Welcome back!".to_string(), |name| format!("Welcome back, {name}!"));
            auth.set(session);
            Ok(
                redirect_with_notice(auth.storage(), Notice::success(greeting), "/account")
                    .await?
                    .into_response(),
            )
        }
        Err(e) => {
            warn!(error = %e, "Login failed");
            let layout = Layout::load(&cart, &auth).await;
            Ok(rerender(layout, e.user_message()).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(cart: CartStore, auth: AuthStore) -> Response {
    if auth.is_authenticated() {
        return Redirect::to("/account").into_response();
    }

    RegisterTemplate {
        layout: Layout::load(&cart, &auth).await,
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        address: String::new(),
        error: None,
    }
    .into_response()
}

/// Check the register form before anything is sent to the backend.
fn validate_registration(form: &RegisterForm) -> std::result::Result<Registration, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Please enter your name".to_string());
    }

    let email = Email::parse(&form.email).map_err(|e| e.to_string())?;

    let password = form.password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if password != form.password_confirm.expose_secret() {
        return Err("Passwords do not match".to_string());
    }

    Ok(Registration {
        name: name.to_string(),
        email,
        password: form.password.clone(),
        phone: form.phone.trim().to_string(),
        address: form.address.trim().to_string(),
    })
}

/// Handle registration form submission.
#[instrument(skip(state, cart, auth, form))]
pub async fn register(
    State(state): State<AppState>,
    cart: CartStore,
    auth: AuthStore,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = match validate_registration(&form) {
        Ok(registration) => registration,
        Err(error) => {
            let layout = Layout::load(&cart, &auth).await;
            return Ok(RegisterTemplate::with_error(layout, &form, error).into_response());
        }
    };

    match state.backend().register(&registration).await {
        Ok(message) => {
            info!("Customer registered");
            let notice = if message.is_empty() {
                Notice::success("Account created. Please sign in.")
            } else {
                Notice::success(message)
            };
            Ok(redirect_with_notice(cart.storage(), notice, "/auth/login")
                .await?
                .into_response())
        }
        Err(e) => {
            warn!(error = %e, "Registration failed");
            let layout = Layout::load(&cart, &auth).await;
            Ok(RegisterTemplate::with_error(layout, &form, e.user_message()).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(mut auth: AuthStore) -> Result<impl IntoResponse> {
    forget_auth(auth.storage()).await?;
    auth.clear();
    clear_sentry_user();

    redirect_with_notice(auth.storage(), Notice::info("You have been signed out"), "/").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: " Ivy ".to_string(),
            email: "ivy@example.com".to_string(),
            password: SecretString::from(password.to_string()),
            password_confirm: SecretString::from(confirm.to_string()),
            phone: String::new(),
            address: "1 Fern Lane".to_string(),
        }
    }

    #[test]
    fn test_validate_registration_accepts_good_form() {
        let registration = validate_registration(&form("hunter22", "hunter22")).unwrap();
        assert_eq!(registration.name, "Ivy");
        assert_eq!(registration.email.as_str(), "ivy@example.com");
    }

    #[test]
    fn test_validate_registration_rejects_mismatch_and_short() {
        assert_eq!(
            validate_registration(&form("hunter22", "hunter23")).unwrap_err(),
            "Passwords do not match"
        );
        assert!(validate_registration(&form("abc", "abc")).unwrap_err().contains("at least"));
    }
}
