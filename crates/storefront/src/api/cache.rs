//! Cache types for catalog responses.

use std::sync::Arc;

use fernhouse_core::{Banner, CatalogItem, CatalogKind, Category};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Page { kind: CatalogKind, page: u32 },
    Count(CatalogKind),
    Item { kind: CatalogKind, slug: String },
    Related { kind: CatalogKind, id: String },
    CategoryItems(String),
    Categories,
    Banners,
}

impl CacheKey {
    /// String form used as the `moka` key.
    pub fn render(&self) -> String {
        match self {
            Self::Page { kind, page } => format!("{}:page:{page}", kind.backend_segment()),
            Self::Count(kind) => format!("{}:count", kind.backend_segment()),
            Self::Item { kind, slug } => format!("{}:item:{slug}", kind.backend_segment()),
            Self::Related { kind, id } => format!("{}:related:{id}", kind.backend_segment()),
            Self::CategoryItems(slug) => format!("category:{slug}"),
            Self::Categories => "categories".to_string(),
            Self::Banners => "banners".to_string(),
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Items(Arc<Vec<CatalogItem>>),
    Item(Arc<CatalogItem>),
    Count(u64),
    CategoryItems(Arc<(Option<Category>, Vec<CatalogItem>)>),
    Categories(Arc<Vec<Category>>),
    Banners(Arc<Vec<Banner>>),
}
