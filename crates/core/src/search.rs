//! Case-insensitive substring filtering over already-loaded records.
//!
//! Filtering never fetches: it narrows whatever the caller has in memory.

use crate::records::{CatalogItem, User};

/// A record that exposes the text fields a search box matches against.
pub trait Searchable {
    /// Fields checked by [`filter_loaded`]. A record matches when any field
    /// contains the query.
    fn search_fields(&self) -> Vec<&str>;
}

/// Catalog items are searched by merchandising code.
impl Searchable for CatalogItem {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.code.as_str()]
    }
}

/// Users are searched by name, email and phone.
impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.phone.as_str()]
    }
}

/// Whether `haystack` contains `needle`, ignoring case.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether any of `fields` contains `query`, ignoring case.
///
/// A blank query matches everything.
#[must_use]
pub fn matches_any(fields: &[&str], query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || fields.iter().any(|field| contains_ignore_case(field, query))
}

/// Keep the records whose search fields contain `query`, preserving order.
#[must_use]
pub fn filter_loaded<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_any(&item.search_fields(), query))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn catalog(code: &str) -> CatalogItem {
        serde_json::from_value(json!({
            "_id": format!("id-{code}"),
            "name": format!("Item {code}"),
            "code": code,
            "price": 10
        }))
        .unwrap()
    }

    fn user(name: &str, email: &str, phone: &str) -> User {
        serde_json::from_value(json!({
            "_id": name, "name": name, "email": email, "phone": phone
        }))
        .unwrap()
    }

    #[test]
    fn test_code_filter_is_case_insensitive_substring() {
        let items = vec![catalog("A1"), catalog("B2"), catalog("a10")];

        let codes: Vec<&str> = filter_loaded(&items, "a1")
            .into_iter()
            .map(|item| item.code.as_str())
            .collect();

        assert_eq!(codes, vec!["A1", "a10"]);
    }

    #[test]
    fn test_blank_query_keeps_everything() {
        let items = vec![catalog("A1"), catalog("B2")];
        assert_eq!(filter_loaded(&items, "   ").len(), 2);
    }

    #[test]
    fn test_users_match_on_any_field() {
        let users = vec![
            user("Hazel", "hazel@fern.test", "555-0100"),
            user("Basil", "b@herb.test", "555-0199"),
        ];

        assert_eq!(filter_loaded(&users, "HAZEL").len(), 1);
        assert_eq!(filter_loaded(&users, "herb.TEST").len(), 1);
        assert_eq!(filter_loaded(&users, "0199").len(), 1);
        assert_eq!(filter_loaded(&users, "555").len(), 2);
        assert!(filter_loaded(&users, "cactus").is_empty());
    }
}
