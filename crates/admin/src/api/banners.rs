use fernhouse_core::{Banner, BannerId};
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use super::types::{BannerListResponse, MessageResponse};
use super::{AdminClient, ApiError, Upload};

/// Fields of the banner form.
#[derive(Debug, Clone, Default)]
pub struct BannerDraft {
    pub heading: String,
    pub subheading: String,
    pub link: String,
    /// New image; `None` keeps the current one.
    pub image: Option<Upload>,
}

impl AdminClient {
    /// The home page banner(s).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip_all)]
    pub async fn banners(&self, token: &str) -> Result<Vec<Banner>, ApiError> {
        let response: BannerListResponse =
            self.execute(self.get(token, "banner/get-banner")?).await?;
        Ok(response.banners)
    }

    /// Update a banner.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the backend refuses the fields.
    #[instrument(skip(self, token, draft))]
    pub async fn update_banner(
        &self,
        token: &str,
        id: &BannerId,
        draft: BannerDraft,
    ) -> Result<String, ApiError> {
        let mut form = Form::new()
            .text("heading", draft.heading)
            .text("subheading", draft.subheading)
            .text("link", draft.link);
        if let Some(upload) = draft.image {
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.content_type)?;
            form = form.part("image", part);
        }

        let path = format!("banner/update-banner/{}", urlencoding::encode(id.as_str()));
        let response: MessageResponse = self
            .execute(self.put(token, &path)?.multipart(form))
            .await?;
        Ok(response.message)
    }
}
