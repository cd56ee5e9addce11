//! Catalog route handlers: plant and pot listings, details, categories and
//! search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use fernhouse_core::search::matches_any;
use fernhouse_core::{CatalogItem, CatalogKind, LoadedList};
use serde::Deserialize;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};
use crate::views::{ItemCard, ItemDetail, Layout};

/// Most pages a listing will accumulate in one request.
const MAX_LISTING_PAGES: u32 = 20;

/// Pages per collection scanned by search.
const SEARCH_PAGES: u32 = 3;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub layout: Layout,
    pub heading: &'static str,
    pub base_path: &'static str,
    pub items: Vec<ItemCard>,
    pub total: u64,
    pub has_more: bool,
    pub next_page: u32,
}

/// Detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/show.html")]
pub struct CatalogShowTemplate {
    pub layout: Layout,
    pub item: ItemDetail,
    pub related: Vec<ItemCard>,
}

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/category.html")]
pub struct CategoryTemplate {
    pub layout: Layout,
    pub name: String,
    pub items: Vec<ItemCard>,
}

/// Search results template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/search.html")]
pub struct SearchTemplate {
    pub layout: Layout,
    pub query: String,
    pub results: Vec<ItemCard>,
}

/// Fetch pages `1..=through` of a collection into a [`LoadedList`].
async fn load_pages(
    state: &AppState,
    kind: CatalogKind,
    through: u32,
) -> std::result::Result<LoadedList<CatalogItem>, ApiError> {
    let backend = state.backend();
    let (first, total) = tokio::join!(backend.list_items(kind, 1), backend.item_count(kind));
    let mut list = LoadedList::first_page(first?.to_vec(), total?);

    while list.pages_loaded() < through && list.has_more() {
        let page = backend.list_items(kind, list.next_page()).await?;
        let held = list.items().len();
        list.append_page(page.to_vec());
        if list.items().len() == held {
            break;
        }
    }

    Ok(list)
}

async fn index(
    state: AppState,
    kind: CatalogKind,
    query: PageQuery,
    cart: CartStore,
    auth: AuthStore,
) -> Result<CatalogIndexTemplate> {
    let through = query.page.unwrap_or(1).clamp(1, MAX_LISTING_PAGES);
    let list = load_pages(&state, kind, through).await?;

    Ok(CatalogIndexTemplate {
        layout: Layout::load(&cart, &auth).await,
        heading: kind.label(),
        base_path: match kind {
            CatalogKind::Product => "/products",
            CatalogKind::Pot => "/pots",
        },
        items: ItemCard::many(list.items(), kind),
        total: list.total(),
        has_more: list.has_more() && list.pages_loaded() < MAX_LISTING_PAGES,
        next_page: list.next_page(),
    })
}

async fn show(
    state: AppState,
    kind: CatalogKind,
    slug: String,
    cart: CartStore,
    auth: AuthStore,
) -> Result<CatalogShowTemplate> {
    let item = match state.backend().get_item(kind, &slug).await {
        Ok(item) => item,
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(slug)),
        Err(e) => return Err(e.into()),
    };

    let related = match &item.category {
        Some(category) => state
            .backend()
            .related_items(kind, &item.id, category.id())
            .await
            .map_or_else(
                |e| {
                    tracing::warn!("Failed to fetch related items for {slug}: {e}");
                    Vec::new()
                },
                |items| ItemCard::many(&items, kind),
            ),
        None => Vec::new(),
    };

    Ok(CatalogShowTemplate {
        layout: Layout::load(&cart, &auth).await,
        item: ItemDetail::new(&item, kind),
        related,
    })
}

/// Display the plant listing.
#[instrument(skip(state, cart, auth))]
pub async fn products_index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    index(state, CatalogKind::Product, query, cart, auth).await
}

/// Display the pot listing.
#[instrument(skip(state, cart, auth))]
pub async fn pots_index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    index(state, CatalogKind::Pot, query, cart, auth).await
}

/// Display a plant.
#[instrument(skip(state, cart, auth))]
pub async fn product_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    show(state, CatalogKind::Product, slug, cart, auth).await
}

/// Display a pot.
#[instrument(skip(state, cart, auth))]
pub async fn pot_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    show(state, CatalogKind::Pot, slug, cart, auth).await
}

/// Display the plants in a category.
#[instrument(skip(state, cart, auth))]
pub async fn category_show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    let found = state.backend().items_in_category(&slug).await?;
    let (category, items) = found.as_ref();

    Ok(CategoryTemplate {
        layout: Layout::load(&cart, &auth).await,
        name: category
            .as_ref()
            .map_or_else(|| slug.clone(), |category| category.name.clone()),
        items: ItemCard::many(items, CatalogKind::Product),
    })
}

/// Keep the items whose name or code contains `query`.
fn search_loaded(items: &[CatalogItem], kind: CatalogKind, query: &str) -> Vec<ItemCard> {
    items
        .iter()
        .filter(|item| matches_any(&[item.name.as_str(), item.code.as_str()], query))
        .map(|item| ItemCard::new(item, kind))
        .collect()
}

/// Search plants and pots by name or code.
///
/// Only the first few pages of each collection are scanned; an empty query
/// shows no results rather than everything.
#[instrument(skip(state, cart, auth))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    cart: CartStore,
    auth: AuthStore,
) -> Result<impl IntoResponse> {
    let needle = query.q.trim().to_string();

    let results = if needle.is_empty() {
        Vec::new()
    } else {
        let (plants, pots) = tokio::join!(
            load_pages(&state, CatalogKind::Product, SEARCH_PAGES),
            load_pages(&state, CatalogKind::Pot, SEARCH_PAGES),
        );
        let mut results = search_loaded(plants?.items(), CatalogKind::Product, &needle);
        results.extend(search_loaded(pots?.items(), CatalogKind::Pot, &needle));
        results
    };

    Ok(SearchTemplate {
        layout: Layout::load(&cart, &auth).await,
        query: needle,
        results,
    })
}
