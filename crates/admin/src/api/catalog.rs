//! Plants, pots and categories.

use fernhouse_core::{CatalogItem, CatalogKind, Category, CategoryId, Price, ProductId};
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::instrument;

use super::types::{
    CategoryListResponse, CategoryResponse, CountResponse, ItemListResponse, ItemResponse,
    MessageResponse,
};
use super::{AdminClient, ApiError};

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fields of the create/edit item form.
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub name: String,
    pub code: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub sizes: Vec<String>,
    pub category: Option<CategoryId>,
    pub shipping: bool,
    /// New image; `None` keeps the current one on update.
    pub image: Option<Upload>,
}

impl ItemDraft {
    /// The multipart body the backend expects.
    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("code", self.code)
            .text("description", self.description)
            .text("price", self.price.amount().to_string())
            .text("quantity", self.stock.to_string())
            .text("sizes", self.sizes.join(","))
            .text("shipping", self.shipping.to_string());

        if let Some(category) = self.category {
            form = form.text("category", category.to_string());
        }

        if let Some(upload) = self.image {
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.content_type)?;
            form = form.part("image", part);
        }

        Ok(form)
    }
}

impl AdminClient {
    /// One page (1-based) of plants or pots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self, token))]
    pub async fn list_items(
        &self,
        token: &str,
        kind: CatalogKind,
        page: u32,
    ) -> Result<Vec<CatalogItem>, ApiError> {
        let segment = kind.backend_segment();
        let request = self
            .get(token, &format!("{segment}/{segment}-list"))?
            .query(&[("page", page)]);
        let response: ItemListResponse = self.execute(request).await?;
        Ok(response.items)
    }

    /// Total number of plants or pots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self, token))]
    pub async fn item_count(&self, token: &str, kind: CatalogKind) -> Result<u64, ApiError> {
        let segment = kind.backend_segment();
        let response: CountResponse = self
            .execute(self.get(token, &format!("{segment}/{segment}-count"))?)
            .await?;
        Ok(response.total)
    }

    /// A single plant or pot, for the edit form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown slugs.
    #[instrument(skip(self, token))]
    pub async fn get_item(
        &self,
        token: &str,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<CatalogItem, ApiError> {
        let segment = kind.backend_segment();
        let path = format!("{segment}/get-{segment}/{}", urlencoding::encode(slug));
        let response: ItemResponse = self.execute(self.get(token, &path)?).await?;
        response.item.ok_or(ApiError::NotFound(path))
    }

    /// Create a plant or pot.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the backend refuses the fields.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_item(
        &self,
        token: &str,
        kind: CatalogKind,
        draft: ItemDraft,
    ) -> Result<String, ApiError> {
        let segment = kind.backend_segment();
        let request = self
            .post(token, &format!("{segment}/create-{segment}"))?
            .multipart(draft.into_form()?);
        let response: MessageResponse = self.execute(request).await?;
        Ok(response.message)
    }

    /// Update a plant or pot.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the backend refuses the fields.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn update_item(
        &self,
        token: &str,
        kind: CatalogKind,
        id: &ProductId,
        draft: ItemDraft,
    ) -> Result<String, ApiError> {
        let segment = kind.backend_segment();
        let path = format!(
            "{segment}/update-{segment}/{}",
            urlencoding::encode(id.as_str())
        );
        let request = self.put(token, &path)?.multipart(draft.into_form()?);
        let response: MessageResponse = self.execute(request).await?;
        Ok(response.message)
    }

    /// Delete a plant or pot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not confirm the delete.
    #[instrument(skip(self, token))]
    pub async fn delete_item(
        &self,
        token: &str,
        kind: CatalogKind,
        id: &ProductId,
    ) -> Result<(), ApiError> {
        let segment = kind.backend_segment();
        let path = format!(
            "{segment}/delete-{segment}/{}",
            urlencoding::encode(id.as_str())
        );
        let _: MessageResponse = self.execute(self.delete(token, &path)?).await?;
        Ok(())
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip_all)]
    pub async fn categories(&self, token: &str) -> Result<Vec<Category>, ApiError> {
        let response: CategoryListResponse = self
            .execute(self.get(token, "category/get-category")?)
            .await?;
        Ok(response.category)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the name is taken.
    #[instrument(skip(self, token))]
    pub async fn create_category(
        &self,
        token: &str,
        name: &str,
    ) -> Result<Option<Category>, ApiError> {
        let request = self
            .post(token, "category/create-category")?
            .json(&json!({ "name": name }));
        let response: CategoryResponse = self.execute(request).await?;
        Ok(response.category)
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the name is taken.
    #[instrument(skip(self, token))]
    pub async fn rename_category(
        &self,
        token: &str,
        id: &CategoryId,
        name: &str,
    ) -> Result<Option<Category>, ApiError> {
        let path = format!(
            "category/update-category/{}",
            urlencoding::encode(id.as_str())
        );
        let request = self.put(token, &path)?.json(&json!({ "name": name }));
        let response: CategoryResponse = self.execute(request).await?;
        Ok(response.category)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not confirm the delete.
    #[instrument(skip(self, token))]
    pub async fn delete_category(&self, token: &str, id: &CategoryId) -> Result<(), ApiError> {
        let path = format!(
            "category/delete-category/{}",
            urlencoding::encode(id.as_str())
        );
        let _: MessageResponse = self.execute(self.delete(token, &path)?).await?;
        Ok(())
    }
}
