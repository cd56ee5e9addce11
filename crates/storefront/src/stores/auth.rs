//! Auth store: the visitor's `{user, token}`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fernhouse_core::AuthSession;
use serde_json::Value;

use super::session_storage;
use crate::error::AppError;
use crate::persistence::{ClientStorage, SessionStorage, load_auth};
use crate::state::AppState;

/// The current login for one request.
///
/// Hydrated once from the `user` key. `set` and `clear` change only the
/// in-memory copy; the login and logout handlers write the key themselves.
#[derive(Debug, Clone)]
pub struct AuthStore<S = SessionStorage> {
    storage: S,
    session: AuthSession,
}

impl<S: ClientStorage> AuthStore<S> {
    /// Hydrate from `storage`. A missing or malformed value leaves the store
    /// signed out.
    pub async fn load(storage: S) -> Self {
        let session = load_auth(&storage).await;
        Self { storage, session }
    }

    #[must_use]
    pub const fn session(&self) -> &AuthSession {
        &self.session
    }

    #[must_use]
    pub const fn user(&self) -> Option<&Value> {
        self.session.user.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.session.token
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn set(&mut self, session: AuthSession) {
        self.session = session;
    }

    pub fn clear(&mut self) {
        self.session = AuthSession::default();
    }

    /// The storage this store was hydrated from.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

impl FromRequestParts<AppState> for AuthStore<SessionStorage> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let storage = session_storage(parts, "AuthStore")?;
        Ok(Self::load(storage).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::persistence::{MemoryStorage, keys};

    #[tokio::test]
    async fn test_hydrates_stored_object() {
        let storage = MemoryStorage::new();
        storage
            .store(keys::USER, json!({"user": {"_id": "u1"}, "token": "t"}))
            .await
            .unwrap();

        let store = AuthStore::load(storage).await;
        assert_eq!(store.user(), Some(&json!({"_id": "u1"})));
        assert_eq!(store.token(), "t");
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_absent_value_is_signed_out() {
        let store = AuthStore::load(MemoryStorage::new()).await;
        assert_eq!(store.session(), &AuthSession::default());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_set_and_clear_do_not_write_back() {
        let storage = MemoryStorage::new();
        let mut store = AuthStore::load(storage.clone()).await;

        store.set(AuthSession::new(json!({"_id": "u2"}), "tok"));
        assert!(store.is_authenticated());
        assert!(storage.snapshot(keys::USER).await.is_none());

        store.clear();
        assert_eq!(store.token(), "");
    }
}
