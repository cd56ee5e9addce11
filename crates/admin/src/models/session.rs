//! Session-stored admin identity and session keys.

use fernhouse_core::{AuthSession, UserId, UserRole};
use serde::{Deserialize, Serialize};

/// Session-stored admin identity.
///
/// Built only from a login whose user record has `role = 1` and whose token
/// the backend confirmed through the admin check.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Backend token sent as the `Authorization` header.
    pub token: String,
}

impl CurrentAdmin {
    /// Take the admin identity out of a login, if the user is an admin.
    #[must_use]
    pub fn from_login(session: &AuthSession) -> Option<Self> {
        if !session.is_authenticated() || session.role() != UserRole::Admin {
            return None;
        }

        Some(Self {
            id: session.user_id()?,
            name: session.user_name().unwrap_or_default().to_string(),
            email: session.user_email().unwrap_or_default().to_string(),
            token: session.token.clone(),
        })
    }
}

impl std::fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for admin data.
pub mod keys {
    /// The signed-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// One-shot notice for the next page.
    pub const FLASH: &str = "flash";

    /// Loaded plants list.
    pub const PRODUCT_LIST: &str = "list:products";

    /// Loaded pots list.
    pub const POT_LIST: &str = "list:pots";

    /// Loaded users list.
    pub const USER_LIST: &str = "list:users";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_login_requires_admin_role() {
        let admin = AuthSession::new(
            json!({"_id": "u1", "name": "Rowan", "email": "r@x.test", "role": 1}),
            "tok",
        );
        let customer = AuthSession::new(json!({"_id": "u2", "role": 0}), "tok");

        let current = CurrentAdmin::from_login(&admin).unwrap();
        assert_eq!(current.name, "Rowan");
        assert!(CurrentAdmin::from_login(&customer).is_none());
        assert!(CurrentAdmin::from_login(&AuthSession::default()).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let admin = AuthSession::new(json!({"_id": "u1", "role": 1}), "secret-token");
        let current = CurrentAdmin::from_login(&admin).unwrap();
        assert!(!format!("{current:?}").contains("secret-token"));
    }
}
