//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use fernhouse_core::CatalogKind;
use tower_sessions::Session;
use tracing::instrument;

use super::Shell;
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// One dashboard tile.
#[derive(Debug, Clone)]
pub struct CountCard {
    pub label: &'static str,
    pub href: &'static str,
    /// `None` when the backend could not count.
    pub count: Option<u64>,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: Shell,
    pub cards: Vec<CountCard>,
}

/// A count, or `None` with a warning. An expired token still fails the page.
fn count_or_none(label: &str, result: std::result::Result<u64, ApiError>) -> Result<Option<u64>> {
    match result {
        Ok(count) => Ok(Some(count)),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, label, "Dashboard count unavailable");
            Ok(None)
        }
    }
}

/// Dashboard page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<DashboardTemplate> {
    let backend = state.backend();
    let (products, pots, users) = tokio::join!(
        backend.item_count(&admin.token, CatalogKind::Product),
        backend.item_count(&admin.token, CatalogKind::Pot),
        backend.user_count(&admin.token),
    );

    let cards = vec![
        CountCard {
            label: "Plants",
            href: "/products",
            count: count_or_none("products", products)?,
        },
        CountCard {
            label: "Pots",
            href: "/pots",
            count: count_or_none("pots", pots)?,
        },
        CountCard {
            label: "Users",
            href: "/users",
            count: count_or_none("users", users)?,
        },
    ];

    Ok(DashboardTemplate {
        shell: Shell::load(&admin, &session, "/").await,
        cards,
    })
}
