//! Category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use fernhouse_core::{Category, CategoryId, Notice};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Shell, redirect_with_notice};
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

const BASE_PATH: &str = "/categories";

/// Create and rename form data.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub shell: Shell,
    pub categories: Vec<Category>,
}

/// Turn a backend outcome into the notice shown on the categories page.
///
/// An expired token is passed through so the admin is sent to sign in.
fn outcome_notice(
    outcome: std::result::Result<(), ApiError>,
    done: &str,
) -> std::result::Result<Notice, ApiError> {
    match outcome {
        Ok(()) => Ok(Notice::success(done)),
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, "Category change failed");
            Ok(Notice::error(e.user_message()))
        }
    }
}

/// Trimmed name, or `None` when blank.
fn clean_name(raw: &str) -> Option<&str> {
    let name = raw.trim();
    (!name.is_empty()).then_some(name)
}

/// Categories list with create and rename forms.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<CategoriesTemplate> {
    let categories = state.backend().categories(&admin.token).await?;

    Ok(CategoriesTemplate {
        shell: Shell::load(&admin, &session, BASE_PATH).await,
        categories,
    })
}

/// Create a category.
#[instrument(skip(admin, state, session))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let Some(name) = clean_name(&form.name) else {
        return redirect_with_notice(&session, Notice::error("Name is required"), BASE_PATH).await;
    };

    let outcome = state
        .backend()
        .create_category(&admin.token, name)
        .await
        .map(|_| ());
    let notice = outcome_notice(outcome, &format!("Created \"{name}\""))?;
    redirect_with_notice(&session, notice, BASE_PATH).await
}

/// Rename a category.
#[instrument(skip(admin, state, session))]
pub async fn rename(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect> {
    let Some(name) = clean_name(&form.name) else {
        return redirect_with_notice(&session, Notice::error("Name is required"), BASE_PATH).await;
    };

    let outcome = state
        .backend()
        .rename_category(&admin.token, &CategoryId::new(id), name)
        .await
        .map(|_| ());
    let notice = outcome_notice(outcome, &format!("Renamed to \"{name}\""))?;
    redirect_with_notice(&session, notice, BASE_PATH).await
}

/// Delete a category.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let outcome = state
        .backend()
        .delete_category(&admin.token, &CategoryId::new(id))
        .await;
    let notice = outcome_notice(outcome, "Category deleted")?;
    redirect_with_notice(&session, notice, BASE_PATH).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernhouse_core::NoticeLevel;

    use super::*;

    #[test]
    fn test_blank_names_are_refused() {
        assert_eq!(clean_name("  Succulents "), Some("Succulents"));
        assert_eq!(clean_name("   "), None);
    }

    #[test]
    fn test_outcome_notice() {
        let ok = outcome_notice(Ok(()), "Created").unwrap();
        assert_eq!(ok.level, NoticeLevel::Success);

        let refused =
            outcome_notice(Err(ApiError::Rejected("Category exists".to_string())), "x").unwrap();
        assert_eq!(refused.level, NoticeLevel::Error);
        assert_eq!(refused.message, "Category exists");

        assert!(outcome_notice(Err(ApiError::Unauthorized), "x").is_err());
    }
}
