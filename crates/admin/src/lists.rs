//! "Load more" lists kept in the admin's session record.
//!
//! The plants, pots and users pages each hold a [`LoadedList`] under their
//! own session key. Loading appends, filtering narrows what is loaded, and a
//! delete only touches the list once the backend has confirmed it.

use std::future::Future;

use fernhouse_core::{Keyed, LoadedList};
use serde::{Serialize, de::DeserializeOwned};
use tower_sessions::Session;
use tracing::warn;

use crate::api::ApiError;

/// Read the list under `key`; missing or unreadable data starts empty.
pub async fn load_list<T: DeserializeOwned>(session: &Session, key: &str) -> LoadedList<T> {
    match session.get::<LoadedList<T>>(key).await {
        Ok(Some(list)) => list,
        Ok(None) => LoadedList::default(),
        Err(e) => {
            warn!(key, error = %e, "Discarding unreadable list");
            LoadedList::default()
        }
    }
}

/// Store the list under `key`.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_list<T: Serialize + Send + Sync>(
    session: &Session,
    key: &str,
    list: &LoadedList<T>,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(key, list).await
}

/// Start over from page one.
///
/// # Errors
///
/// Returns the backend error; `list` is untouched in that case.
pub async fn reload<T, P, C>(list: &mut LoadedList<T>, first_page: P, count: C) -> Result<(), ApiError>
where
    P: Future<Output = Result<Vec<T>, ApiError>>,
    C: Future<Output = Result<u64, ApiError>>,
{
    let (items, total) = tokio::join!(first_page, count);
    *list = LoadedList::first_page(items?, total?);
    Ok(())
}

/// Append the page produced by `fetch` (which should request
/// `list.next_page()`). Records already loaded are skipped, so a page
/// re-fetched after a delete only adds what moved into it.
///
/// # Errors
///
/// Returns the backend error; `list` is untouched in that case.
pub async fn load_more<T, F>(list: &mut LoadedList<T>, fetch: F) -> Result<(), ApiError>
where
    T: Keyed,
    F: Future<Output = Result<Vec<T>, ApiError>>,
{
    let page = fetch.await?;
    list.append_page(page);
    Ok(())
}

/// How a delete from a loaded list ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The backend deleted the record and it left the list.
    Deleted,
    /// The backend refused or was unreachable; the list is unchanged.
    Failed(String),
}

/// Run `delete` and drop `key` from `list` only if it succeeded.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when the admin's token was rejected;
/// every other failure is reported as [`DeleteOutcome::Failed`].
pub async fn delete_and_reconcile<T, F>(
    list: &mut LoadedList<T>,
    key: &str,
    delete: F,
) -> Result<DeleteOutcome, ApiError>
where
    T: Keyed,
    F: Future<Output = Result<(), ApiError>>,
{
    match delete.await {
        Ok(()) => {
            list.remove_key(key);
            Ok(DeleteOutcome::Deleted)
        }
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
        Err(e) => {
            warn!(key, error = %e, "Delete failed, keeping loaded list");
            Ok(DeleteOutcome::Failed(e.user_message()))
        }
    }
}
