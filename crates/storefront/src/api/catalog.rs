//! Catalog reads: plants, pots, categories and banners.
//!
//! Everything here is cached; nothing here needs a token.

use std::sync::Arc;

use fernhouse_core::{Banner, CatalogItem, CatalogKind, Category, CategoryId, ProductId};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    BannerListResponse, CategoryItemsResponse, CategoryListResponse, CountResponse,
    ItemListResponse, ItemResponse,
};
use super::{ApiError, BackendClient};

impl BackendClient {
    /// One page (1-based) of plants or pots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        kind: CatalogKind,
        page: u32,
    ) -> Result<Arc<Vec<CatalogItem>>, ApiError> {
        let cache_key = CacheKey::Page { kind, page }.render();

        // Check cache
        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for {cache_key}");
            return Ok(items);
        }

        let segment = kind.backend_segment();
        let request = self
            .get(&format!("{segment}/{segment}-list"))?
            .query(&[("page", page)]);
        let response: ItemListResponse = self.execute(request).await?;

        let items = Arc::new(response.items);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Items(Arc::clone(&items)))
            .await;
        Ok(items)
    }

    /// Total number of plants or pots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn item_count(&self, kind: CatalogKind) -> Result<u64, ApiError> {
        let cache_key = CacheKey::Count(kind).render();

        if let Some(CacheValue::Count(total)) = self.inner.cache.get(&cache_key).await {
            return Ok(total);
        }

        let segment = kind.backend_segment();
        let response: CountResponse = self
            .execute(self.get(&format!("{segment}/{segment}-count"))?)
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Count(response.total))
            .await;
        Ok(response.total)
    }

    /// A single plant or pot by slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown slugs.
    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        kind: CatalogKind,
        slug: &str,
    ) -> Result<Arc<CatalogItem>, ApiError> {
        let cache_key = CacheKey::Item {
            kind,
            slug: slug.to_string(),
        }
        .render();

        if let Some(CacheValue::Item(item)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for {cache_key}");
            return Ok(item);
        }

        let segment = kind.backend_segment();
        let path = format!(
            "{segment}/get-{segment}/{}",
            urlencoding::encode(slug)
        );
        let response: ItemResponse = self.execute(self.get(&path)?).await?;

        let item = Arc::new(response.item);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Item(Arc::clone(&item)))
            .await;
        Ok(item)
    }

    /// Items in the same category as `id`, excluding it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn related_items(
        &self,
        kind: CatalogKind,
        id: &ProductId,
        category: &CategoryId,
    ) -> Result<Arc<Vec<CatalogItem>>, ApiError> {
        let cache_key = CacheKey::Related {
            kind,
            id: id.to_string(),
        }
        .render();

        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&cache_key).await {
            return Ok(items);
        }

        let segment = kind.backend_segment();
        let path = format!(
            "{segment}/related-{segment}/{}/{}",
            urlencoding::encode(id.as_str()),
            urlencoding::encode(category.as_str())
        );
        let response: ItemListResponse = self.execute(self.get(&path)?).await?;

        let items = Arc::new(response.items);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Items(Arc::clone(&items)))
            .await;
        Ok(items)
    }

    /// Plants in the category with `slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn items_in_category(
        &self,
        slug: &str,
    ) -> Result<Arc<(Option<Category>, Vec<CatalogItem>)>, ApiError> {
        let cache_key = CacheKey::CategoryItems(slug.to_string()).render();

        if let Some(CacheValue::CategoryItems(found)) = self.inner.cache.get(&cache_key).await {
            return Ok(found);
        }

        let path = format!("product/product-category/{}", urlencoding::encode(slug));
        let response: CategoryItemsResponse = self.execute(self.get(&path)?).await?;

        let found = Arc::new((response.category, response.items));
        self.inner
            .cache
            .insert(cache_key, CacheValue::CategoryItems(Arc::clone(&found)))
            .await;
        Ok(found)
    }

    /// All categories, for the sidebar.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        let cache_key = CacheKey::Categories.render();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            return Ok(categories);
        }

        let response: CategoryListResponse =
            self.execute(self.get("category/get-category")?).await?;

        let categories = Arc::new(response.category);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    /// Home page banners.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Arc<Vec<Banner>>, ApiError> {
        let cache_key = CacheKey::Banners.render();

        if let Some(CacheValue::Banners(banners)) = self.inner.cache.get(&cache_key).await {
            return Ok(banners);
        }

        let response: BannerListResponse = self.execute(self.get("banner/get-banner")?).await?;

        let banners = Arc::new(response.banners);
        self.inner
            .cache
            .insert(cache_key, CacheValue::Banners(Arc::clone(&banners)))
            .await;
        Ok(banners)
    }
}
