//! Authenticated session snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{UserId, UserRole};

/// `{user, token}` as returned by login and persisted under the `user` key.
///
/// The user record is kept verbatim: the backend owns its shape and the
/// frontend only reads a few fields out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthSession {
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub token: String,
}

impl AuthSession {
    /// Build a session from a login response.
    #[must_use]
    pub fn new(user: Value, token: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            token: token.into(),
        }
    }

    /// Whether a user and a token are both present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && !self.token.is_empty()
    }

    fn field(&self, key: &str) -> Option<&str> {
        self.user.as_ref()?.get(key)?.as_str()
    }

    /// The user's backend id (`_id`).
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.field("_id").map(UserId::new)
    }

    /// Display name, if the record has one.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.field("name")
    }

    /// Email, if the record has one.
    #[must_use]
    pub fn user_email(&self) -> Option<&str> {
        self.field("email")
    }

    /// Role decoded from the numeric `role` field.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.user
            .as_ref()
            .and_then(|user| user.get("role"))
            .and_then(Value::as_u64)
            .and_then(|role| u8::try_from(role).ok())
            .map_or(UserRole::Customer, UserRole::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_shape() {
        let session = AuthSession::default();
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({"user": null, "token": ""})
        );
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_reads_fields_from_opaque_user() {
        let session = AuthSession::new(
            json!({"_id": "u1", "name": "Juniper", "email": "j@x.test", "role": 1, "extra": [1]}),
            "tok",
        );
        assert!(session.is_authenticated());
        assert_eq!(session.user_id(), Some(UserId::new("u1")));
        assert_eq!(session.user_name(), Some("Juniper"));
        assert_eq!(session.role(), UserRole::Admin);
    }

    #[test]
    fn test_round_trips_exactly() {
        let stored = json!({"user": {"_id": "u1"}, "token": "t"});
        let session: AuthSession = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(serde_json::to_value(&session).unwrap(), stored);
    }
}
