//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use fernhouse_core::{Banner, CatalogKind};
use tracing::instrument;

use crate::filters;
use crate::state::AppState;
use crate::stores::{AuthStore, CartStore};
use crate::views::{CategoryLink, ItemCard, Layout};

/// The banner slide shown at the top of the home page.
#[derive(Clone)]
pub struct BannerView {
    pub heading: String,
    pub subheading: String,
    pub image: Option<String>,
    pub link: String,
}

impl From<&Banner> for BannerView {
    fn from(banner: &Banner) -> Self {
        Self {
            heading: banner.heading.clone(),
            subheading: banner.subheading.clone(),
            image: banner.image.clone(),
            link: banner
                .link
                .clone()
                .filter(|link| link.starts_with('/'))
                .unwrap_or_else(|| "/products".to_string()),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub banners: Vec<BannerView>,
    pub categories: Vec<CategoryLink>,
    pub plants: Vec<ItemCard>,
    pub pots: Vec<ItemCard>,
}

/// Display the home page.
///
/// Each section degrades to empty on its own when the backend call behind
/// it fails.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, cart: CartStore, auth: AuthStore) -> impl IntoResponse {
    let backend = state.backend();
    let (banners, categories, plants, pots) = tokio::join!(
        backend.banners(),
        backend.categories(),
        backend.list_items(CatalogKind::Product, 1),
        backend.list_items(CatalogKind::Pot, 1),
    );

    let banners = banners.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch banners: {e}");
            Vec::new()
        },
        |banners| banners.iter().map(BannerView::from).collect(),
    );
    let categories = categories.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch categories: {e}");
            Vec::new()
        },
        |categories| categories.iter().map(CategoryLink::from).collect(),
    );
    let plants = plants.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch plants: {e}");
            Vec::new()
        },
        |items| ItemCard::many(&items, CatalogKind::Product),
    );
    let pots = pots.map_or_else(
        |e| {
            tracing::warn!("Failed to fetch pots: {e}");
            Vec::new()
        },
        |items| ItemCard::many(&items, CatalogKind::Pot),
    );

    HomeTemplate {
        layout: Layout::load(&cart, &auth).await,
        banners,
        categories,
        plants,
        pots,
    }
}
