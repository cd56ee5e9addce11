//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard
//! GET  /                              - Counts of plants, pots, users
//!
//! # Auth (backend login, admin role required)
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Login action (rate limited)
//! POST /auth/logout                   - Logout
//!
//! # Plants (/products) and pots (/pots), same shape
//! GET  /products?q=&refresh=true      - Loaded list, filtered locally by code
//! POST /products/more                 - Append the next page
//! GET  /products/new                  - Create form
//! POST /products                      - Create (multipart)
//! GET  /products/edit/{slug}          - Edit form
//! POST /products/edit/{slug}          - Update (multipart)
//! POST /products/{id}/delete          - Delete, then drop from the loaded list
//!
//! # Users
//! GET  /users?q=&refresh=true         - Loaded list, filtered by name/email/phone
//! POST /users/more                    - Append the next page
//! POST /users/{id}/delete             - Delete, then drop from the loaded list
//!
//! # Categories
//! GET  /categories                    - List + create form
//! POST /categories                    - Create
//! POST /categories/{id}/rename        - Rename
//! POST /categories/{id}/delete        - Delete
//!
//! # Banners
//! GET  /banners                       - Current banners
//! POST /banners/{id}                  - Update (multipart, optional image)
//!
//! # Orders
//! GET  /orders?page=N                 - One backend page of orders
//! POST /orders/{id}/status            - Change status
//! POST /orders/{id}/return            - Approve or reject a return
//! ```

pub mod auth;
pub mod banners;
pub mod catalog;
pub mod categories;
pub mod dashboard;
pub mod forms;
pub mod orders;
pub mod users;

use axum::{
    Extension, Router,
    response::Redirect,
    routing::{get, post},
};
use fernhouse_core::{CatalogKind, Notice};
use tower_sessions::Session;

use crate::error::Result;
use crate::flash::{push_notice, take_notice};
use crate::middleware::login_rate_limiter;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Header and notice data shared by every signed-in page.
#[derive(Debug, Clone)]
pub struct Shell {
    pub admin_name: String,
    pub admin_email: String,
    pub current_path: String,
    pub notice: Option<Notice>,
}

impl Shell {
    /// Build the shell for `current_path`, consuming any queued notice.
    pub async fn load(admin: &CurrentAdmin, session: &Session, current_path: &str) -> Self {
        Self {
            admin_name: admin.name.clone(),
            admin_email: admin.email.clone(),
            current_path: current_path.to_string(),
            notice: take_notice(session).await,
        }
    }

    /// Whether the nav link for `prefix` is the current section.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(prefix)
        }
    }
}

/// Queue `notice` for the next page and redirect to `to`.
pub(crate) async fn redirect_with_notice(
    session: &Session,
    notice: Notice,
    to: &str,
) -> Result<Redirect> {
    push_notice(session, notice).await?;
    Ok(Redirect::to(to))
}

/// Routes for one catalog kind, nested under its route segment.
pub fn catalog_routes(kind: CatalogKind) -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index).post(catalog::create))
        .route("/more", post(catalog::load_more))
        .route("/new", get(catalog::new_form))
        .route("/edit/{slug}", get(catalog::edit_form).post(catalog::update))
        .route("/{id}/delete", post(catalog::delete))
        .layer(Extension(kind))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/more", post(users::load_more))
        .route("/{id}/delete", post(users::delete))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{id}/rename", post(categories::rename))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/status", post(orders::set_status))
        .route("/{id}/return", post(orders::decide_return))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/auth", auth_routes())
        .nest(
            &format!("/{}", CatalogKind::Product.route_segment()),
            catalog_routes(CatalogKind::Product),
        )
        .nest(
            &format!("/{}", CatalogKind::Pot.route_segment()),
            catalog_routes(CatalogKind::Pot),
        )
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .route("/banners", get(banners::index))
        .route("/banners/{id}", post(banners::update))
        .nest("/orders", order_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_active_section() {
        let shell = Shell {
            admin_name: "Ada".to_string(),
            admin_email: "ada@fernhouse.test".to_string(),
            current_path: "/pots/new".to_string(),
            notice: None,
        };

        assert!(shell.is_active("/pots"));
        assert!(!shell.is_active("/"));
        assert!(!shell.is_active("/products"));
    }
}
