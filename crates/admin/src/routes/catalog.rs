//! Plant and pot management.
//!
//! Both kinds share these handlers; the router layers the [`CatalogKind`]
//! in as an extension. The list page works on the session's [`LoadedList`]:
//! the code filter only narrows what is already loaded.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use fernhouse_core::{CatalogItem, CatalogKind, CategoryId, LoadedList, Notice, Price, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::forms::{FormFields, parse_amount, split_list};
use super::{Shell, redirect_with_notice};
use crate::api::{ApiError, ItemDraft, Upload};
use crate::error::{AppError, Result};
use crate::filters;
use crate::lists::{self, DeleteOutcome, delete_and_reconcile, load_list, save_list};
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, keys};
use crate::state::AppState;

/// List page query.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
    /// Drop the loaded pages and start again from page one.
    #[serde(default)]
    pub refresh: bool,
}

/// Hidden fields carried by the list page's POST buttons.
#[derive(Debug, Default, Deserialize)]
pub struct ListForm {
    #[serde(default)]
    pub q: String,
}

/// Session key of the loaded list for `kind`.
const fn list_key(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => keys::PRODUCT_LIST,
        CatalogKind::Pot => keys::POT_LIST,
    }
}

const fn singular(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "Plant",
        CatalogKind::Pot => "Pot",
    }
}

fn base_path(kind: CatalogKind) -> String {
    format!("/{}", kind.route_segment())
}

/// `base` with the filter query kept, so actions land back on the same view.
pub(crate) fn list_path(base: &str, query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?q={}", urlencoding::encode(query))
    }
}

// =============================================================================
// Views
// =============================================================================

/// One row of the list table.
#[derive(Debug, Clone)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub code: String,
    pub price: String,
    pub stock: u32,
    pub category: String,
    pub image: Option<String>,
    pub edit_href: String,
}

impl ItemRow {
    fn new(item: &CatalogItem, kind: CatalogKind) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            code: item.code.clone(),
            price: item.price.display(),
            stock: item.stock,
            category: item
                .category
                .as_ref()
                .and_then(|category| category.name())
                .unwrap_or_default()
                .to_string(),
            image: item.image.clone(),
            edit_href: format!("{}/edit/{}", base_path(kind), item.slug),
        }
    }
}

/// Category choice in the item form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Raw values of the item form, as typed.
#[derive(Debug, Clone, Default)]
pub struct ItemFormValues {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub sizes: String,
    pub category: String,
    pub shipping: bool,
    pub current_image: Option<String>,
}

impl ItemFormValues {
    fn from_item(item: &CatalogItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            code: item.code.clone(),
            description: item.description.clone(),
            price: item.price.amount().to_string(),
            stock: item.stock.to_string(),
            sizes: item.sizes.join(", "),
            category: item
                .category
                .as_ref()
                .map(|category| category.id().to_string())
                .unwrap_or_default(),
            shipping: item.shipping,
            current_image: item.image.clone(),
        }
    }

    fn from_fields(fields: &FormFields) -> Self {
        let current_image = fields.text("current_image");
        Self {
            id: fields.text("id").to_string(),
            name: fields.text("name").to_string(),
            code: fields.text("code").to_string(),
            description: fields.text("description").to_string(),
            price: fields.text("price").to_string(),
            stock: fields.text("quantity").to_string(),
            sizes: fields.text("sizes").to_string(),
            category: fields.text("category").to_string(),
            shipping: fields.checked("shipping"),
            current_image: (!current_image.is_empty()).then(|| current_image.to_string()),
        }
    }

    /// Validate into the backend payload.
    fn to_draft(&self, image: Option<Upload>) -> std::result::Result<ItemDraft, String> {
        if self.name.is_empty() {
            return Err("Name is required".to_string());
        }
        if self.code.is_empty() {
            return Err("Code is required".to_string());
        }
        let price = parse_amount(&self.price, "Price")?;
        let stock = self
            .stock
            .parse::<u32>()
            .map_err(|_| "Quantity must be a whole number".to_string())?;

        Ok(ItemDraft {
            name: self.name.clone(),
            code: self.code.clone(),
            description: self.description.clone(),
            price: Price::new(price),
            stock,
            sizes: split_list(&self.sizes),
            category: (!self.category.is_empty()).then(|| CategoryId::new(self.category.clone())),
            shipping: self.shipping,
            image,
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// List page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub shell: Shell,
    pub heading: &'static str,
    pub singular: &'static str,
    pub base_path: String,
    pub rows: Vec<ItemRow>,
    pub query: String,
    pub loaded: usize,
    pub total: u64,
    pub has_more: bool,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/form.html")]
pub struct ItemFormTemplate {
    pub shell: Shell,
    pub singular: &'static str,
    pub base_path: String,
    pub action: String,
    pub is_new: bool,
    pub values: ItemFormValues,
    pub categories: Vec<CategoryOption>,
    pub error: Option<String>,
}

/// Render the item form, with the category picker filled from the backend.
async fn render_form(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    kind: CatalogKind,
    action: String,
    values: ItemFormValues,
    error: Option<String>,
) -> Result<Response> {
    let categories = match state.backend().categories(&admin.token).await {
        Ok(categories) => categories,
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Category picker unavailable");
            Vec::new()
        }
    };
    let categories = categories
        .iter()
        .map(|category| CategoryOption {
            id: category.id.to_string(),
            name: category.name.clone(),
            selected: category.id.as_str() == values.category,
        })
        .collect();

    let base = base_path(kind);
    Ok(ItemFormTemplate {
        shell: Shell::load(admin, session, &base).await,
        singular: singular(kind),
        base_path: base,
        action,
        is_new: values.id.is_empty(),
        values,
        categories,
        error,
    }
    .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// List page: loads page one on first visit, then filters locally.
#[instrument(skip(admin, state, session))]
pub async fn index(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<CatalogIndexTemplate> {
    let key = list_key(kind);
    let mut list: LoadedList<CatalogItem> = load_list(&session, key).await;

    if list.is_unloaded() || query.refresh {
        let backend = state.backend();
        lists::reload(
            &mut list,
            backend.list_items(&admin.token, kind, 1),
            backend.item_count(&admin.token, kind),
        )
        .await?;
        save_list(&session, key, &list).await?;
    }

    let base = base_path(kind);
    let rows = list
        .filtered(&query.q)
        .into_iter()
        .map(|item| ItemRow::new(item, kind))
        .collect();

    Ok(CatalogIndexTemplate {
        shell: Shell::load(&admin, &session, &base).await,
        heading: kind.label(),
        singular: singular(kind),
        base_path: base,
        rows,
        query: query.q,
        loaded: list.items().len(),
        total: list.total(),
        has_more: list.has_more(),
    })
}

/// Append the next backend page to the loaded list.
#[instrument(skip(admin, state, session))]
pub async fn load_more(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ListForm>,
) -> Result<Redirect> {
    let key = list_key(kind);
    let back = list_path(&base_path(kind), &form.q);
    let mut list: LoadedList<CatalogItem> = load_list(&session, key).await;

    if list.is_unloaded() {
        return Ok(Redirect::to(&back));
    }

    let page = list.next_page();
    match lists::load_more(&mut list, state.backend().list_items(&admin.token, kind, page)).await {
        Ok(()) => {
            save_list(&session, key, &list).await?;
            Ok(Redirect::to(&back))
        }
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, page, "Load more failed");
            redirect_with_notice(&session, Notice::error(e.user_message()), &back).await
        }
    }
}

/// Empty create form.
#[instrument(skip(admin, state, session))]
pub async fn new_form(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let action = base_path(kind);
    render_form(
        &state,
        &session,
        &admin,
        kind,
        action,
        ItemFormValues::default(),
        None,
    )
    .await
}

/// Create an item from the multipart form.
#[instrument(skip(admin, state, session, multipart))]
pub async fn create(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let fields = FormFields::read(multipart).await?;
    let values = ItemFormValues::from_fields(&fields);
    let action = base_path(kind);

    let draft = match values.to_draft(fields.image) {
        Ok(draft) => draft,
        Err(message) => {
            return render_form(&state, &session, &admin, kind, action, values, Some(message))
                .await;
        }
    };

    match state.backend().create_item(&admin.token, kind, draft).await {
        Ok(message) => {
            // New rows may land on any page; start the list over
            session.remove_value(list_key(kind)).await?;
            let message = if message.is_empty() {
                format!("{} created", singular(kind))
            } else {
                message
            };
            Ok(
                redirect_with_notice(&session, Notice::success(message), &base_path(kind))
                    .await?
                    .into_response(),
            )
        }
        Err(e @ (ApiError::Rejected(_) | ApiError::Status { .. })) => {
            render_form(&state, &session, &admin, kind, action, values, Some(e.user_message())).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Edit form for the item with `slug`.
#[instrument(skip(admin, state, session))]
pub async fn edit_form(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Response> {
    let item = state.backend().get_item(&admin.token, kind, &slug).await?;
    let action = format!("{}/edit/{slug}", base_path(kind));
    render_form(
        &state,
        &session,
        &admin,
        kind,
        action,
        ItemFormValues::from_item(&item),
        None,
    )
    .await
}

/// Update the item from the multipart form.
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    let fields = FormFields::read(multipart).await?;
    let values = ItemFormValues::from_fields(&fields);
    if values.id.is_empty() {
        return Err(AppError::BadRequest("Missing item id".to_string()));
    }
    let action = format!("{}/edit/{slug}", base_path(kind));

    let draft = match values.to_draft(fields.image) {
        Ok(draft) => draft,
        Err(message) => {
            return render_form(&state, &session, &admin, kind, action, values, Some(message))
                .await;
        }
    };

    let id = ProductId::new(values.id.clone());
    match state.backend().update_item(&admin.token, kind, &id, draft).await {
        Ok(message) => {
            // The slug follows the name, so the loaded row cannot be patched
            session.remove_value(list_key(kind)).await?;
            let message = if message.is_empty() {
                format!("{} updated", singular(kind))
            } else {
                message
            };
            Ok(
                redirect_with_notice(&session, Notice::success(message), &base_path(kind))
                    .await?
                    .into_response(),
            )
        }
        Err(e @ (ApiError::Rejected(_) | ApiError::Status { .. })) => {
            render_form(&state, &session, &admin, kind, action, values, Some(e.user_message())).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete an item; the loaded list only changes once the backend confirms.
#[instrument(skip(admin, state, session, form))]
pub async fn delete(
    Extension(kind): Extension<CatalogKind>,
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ListForm>,
) -> Result<Redirect> {
    let key = list_key(kind);
    let mut list: LoadedList<CatalogItem> = load_list(&session, key).await;
    let product_id = ProductId::new(id.as_str());

    let notice = match delete_and_reconcile(
        &mut list,
        &id,
        state.backend().delete_item(&admin.token, kind, &product_id),
    )
    .await?
    {
        DeleteOutcome::Deleted => {
            save_list(&session, key, &list).await?;
            Notice::success(format!("{} deleted", singular(kind)))
        }
        DeleteOutcome::Failed(message) => Notice::error(message),
    };

    redirect_with_notice(&session, notice, &list_path(&base_path(kind), &form.q)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn values() -> ItemFormValues {
        ItemFormValues {
            name: "Snake Plant".to_string(),
            code: "SNK-1".to_string(),
            price: "24.5".to_string(),
            stock: "7".to_string(),
            sizes: "S, M".to_string(),
            category: "c1".to_string(),
            ..ItemFormValues::default()
        }
    }

    #[test]
    fn test_valid_form_becomes_draft() {
        let draft = values().to_draft(None).unwrap();
        assert_eq!(draft.price, Price::from_cents(2450));
        assert_eq!(draft.stock, 7);
        assert_eq!(draft.sizes, vec!["S", "M"]);
        assert_eq!(draft.category, Some(CategoryId::new("c1")));
        assert!(draft.image.is_none());
    }

    #[test]
    fn test_form_validation_messages() {
        let missing_name = ItemFormValues {
            name: String::new(),
            ..values()
        };
        assert_eq!(missing_name.to_draft(None).unwrap_err(), "Name is required");

        let bad_stock = ItemFormValues {
            stock: "1.5".to_string(),
            ..values()
        };
        assert_eq!(
            bad_stock.to_draft(None).unwrap_err(),
            "Quantity must be a whole number"
        );

        let bad_price = ItemFormValues {
            price: "cheap".to_string(),
            ..values()
        };
        assert_eq!(bad_price.to_draft(None).unwrap_err(), "Price must be a number");
    }

    #[test]
    fn test_item_round_trips_through_form_values() {
        let item: CatalogItem = serde_json::from_value(json!({
            "_id": "p1", "name": "Fern", "slug": "fern", "code": "FRN",
            "price": 12.5, "quantity": 3, "sizes": ["S", "L"],
            "category": {"_id": "c1", "name": "Indoor", "slug": "indoor"}
        }))
        .unwrap();

        let values = ItemFormValues::from_item(&item);
        assert_eq!(values.category, "c1");
        assert_eq!(values.sizes, "S, L");

        let draft = values.to_draft(None).unwrap();
        assert_eq!(draft.price, item.price);
        assert_eq!(draft.stock, item.stock);
        assert_eq!(draft.sizes, item.sizes);
    }

    #[test]
    fn test_list_path_keeps_filter() {
        assert_eq!(list_path("/pots", ""), "/pots");
        assert_eq!(list_path("/pots", " a 1 "), "/pots?q=a%201");
    }

    #[test]
    fn test_row_links_to_edit_by_slug() {
        let item: CatalogItem = serde_json::from_value(json!({
            "_id": "t1", "name": "Terracotta", "slug": "terracotta", "price": 9
        }))
        .unwrap();
        let row = ItemRow::new(&item, CatalogKind::Pot);
        assert_eq!(row.edit_href, "/pots/edit/terracotta");
        assert_eq!(row.price, "$9.00");
    }
}
