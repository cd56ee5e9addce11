//! Customer account management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use fernhouse_core::{LoadedList, Notice, User, UserId, UserRole};
use tower_sessions::Session;
use tracing::instrument;

use super::catalog::{ListForm, ListQuery, list_path};
use super::{Shell, redirect_with_notice};
use crate::api::ApiError;
use crate::error::Result;
use crate::filters;
use crate::lists::{self, DeleteOutcome, delete_and_reconcile, load_list, save_list};
use crate::middleware::RequireAdminAuth;
use crate::models::keys;
use crate::state::AppState;

const BASE_PATH: &str = "/users";

/// One row of the users table.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub is_admin: bool,
    /// Admins cannot delete themselves from here.
    pub is_self: bool,
}

impl UserRow {
    fn new(user: &User, current: &UserId) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            is_admin: user.role == UserRole::Admin,
            is_self: &user.id == current,
        }
    }
}

/// Users list template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub shell: Shell,
    pub rows: Vec<UserRow>,
    pub query: String,
    pub loaded: usize,
    pub total: u64,
    pub has_more: bool,
}

/// Users list: loads page one on first visit, then filters by name, email
/// or phone without fetching.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<UsersIndexTemplate> {
    let mut list: LoadedList<User> = load_list(&session, keys::USER_LIST).await;

    if list.is_unloaded() || query.refresh {
        let backend = state.backend();
        lists::reload(
            &mut list,
            backend.list_users(&admin.token, 1),
            backend.user_count(&admin.token),
        )
        .await?;
        save_list(&session, keys::USER_LIST, &list).await?;
    }

    let rows = list
        .filtered(&query.q)
        .into_iter()
        .map(|user| UserRow::new(user, &admin.id))
        .collect();

    Ok(UsersIndexTemplate {
        shell: Shell::load(&admin, &session, BASE_PATH).await,
        rows,
        query: query.q,
        loaded: list.items().len(),
        total: list.total(),
        has_more: list.has_more(),
    })
}

/// Append the next page of users.
#[instrument(skip(admin, state, session))]
pub async fn load_more(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ListForm>,
) -> Result<Redirect> {
    let back = list_path(BASE_PATH, &form.q);
    let mut list: LoadedList<User> = load_list(&session, keys::USER_LIST).await;

    if list.is_unloaded() {
        return Ok(Redirect::to(&back));
    }

    let page = list.next_page();
    match lists::load_more(&mut list, state.backend().list_users(&admin.token, page)).await {
        Ok(()) => {
            save_list(&session, keys::USER_LIST, &list).await?;
            Ok(Redirect::to(&back))
        }
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::warn!(error = %e, page, "Load more users failed");
            redirect_with_notice(&session, Notice::error(e.user_message()), &back).await
        }
    }
}

/// Delete a user; a refused delete leaves the loaded list as it was.
#[instrument(skip(admin, state, session, form))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ListForm>,
) -> Result<Redirect> {
    let back = list_path(BASE_PATH, &form.q);
    let user_id = UserId::new(id.as_str());

    if user_id == admin.id {
        return redirect_with_notice(
            &session,
            Notice::error("You cannot delete your own account"),
            &back,
        )
        .await;
    }

    let mut list: LoadedList<User> = load_list(&session, keys::USER_LIST).await;
    let notice = match delete_and_reconcile(
        &mut list,
        &id,
        state.backend().delete_user(&admin.token, &user_id),
    )
    .await?
    {
        DeleteOutcome::Deleted => {
            save_list(&session, keys::USER_LIST, &list).await?;
            Notice::success("User deleted")
        }
        DeleteOutcome::Failed(message) => Notice::error(message),
    };

    redirect_with_notice(&session, notice, &back).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_row_flags_admin_and_self() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1", "name": "Ada", "email": "ada@x.test", "role": 1
        }))
        .unwrap();

        let own = UserRow::new(&user, &UserId::new("u1"));
        assert!(own.is_admin);
        assert!(own.is_self);

        let other = UserRow::new(&user, &UserId::new("u2"));
        assert!(!other.is_self);
    }
}
