//! Request-scoped stores over the visitor's persisted state.
//!
//! A store is built per request from the session record (its "provider").
//! Handlers take [`CartStore`] or [`AuthStore`] as extractors; using either
//! on a router without the session layer fails with
//! [`StoreError::ProviderMissing`] instead of silently starting empty.

pub mod auth;
pub mod cart;

use axum::http::request::Parts;
use fernhouse_core::CartError;
use thiserror::Error;
use tower_sessions::Session;

use crate::persistence::{SessionStorage, StorageError};

pub use auth::AuthStore;
pub use cart::CartStore;

/// Errors from store access and mutation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was used on a request the session layer never saw.
    #[error("{store} used outside its provider: session layer is not installed")]
    ProviderMissing { store: &'static str },

    /// Reading or writing persisted state failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The cart rejected a transition.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// The session storage for this request, or `ProviderMissing` naming `store`.
pub(crate) fn session_storage(
    parts: &Parts,
    store: &'static str,
) -> Result<SessionStorage, StoreError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .map(SessionStorage::new)
        .ok_or(StoreError::ProviderMissing { store })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[test]
    fn test_missing_session_names_the_store() {
        let (parts, ()) = Request::builder().uri("/cart").body(()).unwrap().into_parts();

        let err = session_storage(&parts, "CartStore").unwrap_err();
        assert!(matches!(err, StoreError::ProviderMissing { store: "CartStore" }));
        assert_eq!(
            err.to_string(),
            "CartStore used outside its provider: session layer is not installed"
        );
    }
}
