//! Newtype IDs for type-safe references to backend records.
//!
//! The backend hands out opaque string identifiers (`_id`). Use the
//! `define_id!` macro to wrap them so a user id can never be passed where a
//! product id is expected.

/// Macro to define a type-safe ID wrapper around an opaque backend string.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `as_str()`, `Display`, `From<String>`, `From<&str>`
///
/// # Example
///
/// ```rust
/// # use fernhouse_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::new("u1");
/// assert_eq!(user_id.as_str(), "u1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = OrderId::new("o1");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CategoryId);
define_id!(BannerId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_transparent_strings() {
        let id = ProductId::new("65f1c0");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"65f1c0\"");
        let back: ProductId = serde_json::from_str("\"65f1c0\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "65f1c0");
    }
}
