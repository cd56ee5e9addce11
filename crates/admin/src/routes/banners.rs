//! Home page banner editor.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};
use fernhouse_core::{Banner, BannerId, Notice};
use tower_sessions::Session;
use tracing::instrument;

use super::forms::FormFields;
use super::{Shell, redirect_with_notice};
use crate::api::{ApiError, BannerDraft};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

const BASE_PATH: &str = "/banners";

/// Banners page template.
#[derive(Template, WebTemplate)]
#[template(path = "banners/index.html")]
pub struct BannersTemplate {
    pub shell: Shell,
    pub banners: Vec<Banner>,
}

/// Validate the banner form.
fn banner_draft(fields: FormFields) -> std::result::Result<BannerDraft, String> {
    let heading = fields.text("heading").to_string();
    if heading.is_empty() {
        return Err("Heading is required".to_string());
    }
    let link = fields.text("link").to_string();
    if !link.is_empty() && !link.starts_with('/') && !link.starts_with("https://") {
        return Err("Link must be a site path or an https:// URL".to_string());
    }

    Ok(BannerDraft {
        heading,
        subheading: fields.text("subheading").to_string(),
        link,
        image: fields.image,
    })
}

/// Show the current banners, each with an edit form.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<BannersTemplate> {
    let banners = state.backend().banners(&admin.token).await?;

    Ok(BannersTemplate {
        shell: Shell::load(&admin, &session, BASE_PATH).await,
        banners,
    })
}

/// Update a banner; an empty file input keeps the current image.
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Redirect> {
    let draft = match banner_draft(FormFields::read(multipart).await?) {
        Ok(draft) => draft,
        Err(message) => {
            return redirect_with_notice(&session, Notice::error(message), BASE_PATH).await;
        }
    };

    let notice = match state
        .backend()
        .update_banner(&admin.token, &BannerId::new(id), draft)
        .await
    {
        Ok(_) => Notice::success("Banner updated"),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Banner update failed");
            Notice::error(e.user_message())
        }
    };

    redirect_with_notice(&session, notice, BASE_PATH).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_draft_validation() {
        let draft = banner_draft(FormFields::from_pairs(&[
            ("heading", " Spring sale "),
            ("link", "/pots"),
        ]))
        .unwrap();
        assert_eq!(draft.heading, "Spring sale");
        assert!(draft.image.is_none());

        assert_eq!(
            banner_draft(FormFields::from_pairs(&[("heading", "")])).unwrap_err(),
            "Heading is required"
        );
        assert!(
            banner_draft(FormFields::from_pairs(&[
                ("heading", "Hi"),
                ("link", "javascript:alert(1)"),
            ]))
            .is_err()
        );
    }
}
