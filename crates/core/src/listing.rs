//! Incrementally loaded lists for "load more" views.

use serde::{Deserialize, Serialize};

use crate::records::{CatalogItem, Category, Order, User};
use crate::search::{Searchable, filter_loaded};

/// A record with a stable identifier used to reconcile local lists.
pub trait Keyed {
    /// The record's identifier as a string.
    fn key(&self) -> &str;
}

impl Keyed for CatalogItem {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for User {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for Category {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

impl Keyed for Order {
    fn key(&self) -> &str {
        self.id.as_str()
    }
}

/// The pages of a collection fetched so far, plus the backend's total count.
///
/// Pages are 1-based, matching the backend's `page` query parameter. The
/// loaded items are always a prefix of the backend's ordering, so the next
/// page is located from how many items are held rather than how many pages
/// were fetched. Deleting a loaded record shifts every later record up one
/// slot on the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedList<T> {
    items: Vec<T>,
    pages_loaded: u32,
    total: u64,
    #[serde(default)]
    page_size: u32,
}

impl<T> Default for LoadedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pages_loaded: 0,
            total: 0,
            page_size: 0,
        }
    }
}

impl<T> LoadedList<T> {
    /// Start a list from its first page; its length is taken as the page size.
    #[must_use]
    pub fn first_page(items: Vec<T>, total: u64) -> Self {
        let page_size = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            items,
            pages_loaded: 1,
            total,
            page_size,
        }
    }

    /// Page number to request next.
    ///
    /// This is the page holding the first record not yet loaded. After
    /// deletes it can be a page that was already fetched.
    #[must_use]
    pub fn next_page(&self) -> u32 {
        if self.page_size == 0 {
            return self.pages_loaded + 1;
        }
        let held = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        held / self.page_size + 1
    }

    /// Highest page fetched so far.
    #[must_use]
    pub const fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    /// Whether the backend reports more records than are loaded.
    #[must_use]
    pub fn has_more(&self) -> bool {
        (self.items.len() as u64) < self.total
    }

    /// Backend total.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// All loaded items.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether nothing has been loaded yet.
    #[must_use]
    pub const fn is_unloaded(&self) -> bool {
        self.pages_loaded == 0
    }
}

impl<T: Keyed> LoadedList<T> {
    /// Append the page numbered [`next_page`](Self::next_page), skipping
    /// records that are already loaded.
    pub fn append_page(&mut self, items: Vec<T>) {
        let page = self.next_page();
        for item in items {
            if self.get(item.key()).is_none() {
                self.items.push(item);
            }
        }
        self.pages_loaded = self.pages_loaded.max(page);
    }

    /// Drop the record with `key` after a successful delete.
    ///
    /// Returns whether a record was removed; the total shrinks with it.
    pub fn remove_key(&mut self, key: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.key() != key);
        let removed = self.items.len() != before;
        if removed {
            self.total = self.total.saturating_sub(1);
        }
        removed
    }

    /// Look up a loaded record.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }
}

impl<T: Searchable> LoadedList<T> {
    /// Loaded records matching `query`; never fetches.
    #[must_use]
    pub fn filtered(&self, query: &str) -> Vec<&T> {
        filter_loaded(&self.items, query)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user(id: &str, name: &str) -> User {
        serde_json::from_value(json!({"_id": id, "name": name, "email": format!("{id}@x.test")}))
            .unwrap()
    }

    #[test]
    fn test_load_more_appends_and_tracks_pages() {
        let mut list = LoadedList::first_page(vec![user("1", "Ash"), user("2", "Birch")], 3);
        assert_eq!(list.next_page(), 2);
        assert!(list.has_more());

        list.append_page(vec![user("3", "Cedar")]);
        assert_eq!(list.items().len(), 3);
        assert_eq!(list.pages_loaded(), 2);
        assert!(!list.has_more());
    }

    #[test]
    fn test_filter_narrows_loaded_set_only() {
        let list = LoadedList::first_page(vec![user("1", "Ash"), user("2", "Birch")], 40);
        let found = list.filtered("bir");
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().unwrap().name, "Birch");
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_remove_key_reconciles_total() {
        let mut list = LoadedList::first_page(vec![user("1", "Ash"), user("2", "Birch")], 2);
        assert!(list.remove_key("1"));
        assert!(!list.remove_key("1"));
        assert_eq!(list.total(), 1);
        assert!(list.get("2").is_some());
    }

    #[test]
    fn test_load_more_after_delete_refetches_shifted_page() {
        // Backend order a, b, c, d with two records per page
        let mut list = LoadedList::first_page(vec![user("a", "Ash"), user("b", "Birch")], 4);
        assert!(list.remove_key("a"));

        // The backend now serves b, c on page 1 and d on page 2
        assert_eq!(list.next_page(), 1);
        list.append_page(vec![user("b", "Birch"), user("c", "Cedar")]);
        assert_eq!(list.next_page(), 2);
        list.append_page(vec![user("d", "Dogwood")]);

        let keys: Vec<&str> = list.items().iter().map(Keyed::key).collect();
        assert_eq!(keys, ["b", "c", "d"]);
        assert_eq!(list.total(), 3);
        assert!(!list.has_more());
    }

    #[test]
    fn test_deleting_a_whole_page_steps_back_one_page() {
        let mut list = LoadedList::first_page(vec![user("a", "Ash"), user("b", "Birch")], 6);
        list.append_page(vec![user("c", "Cedar"), user("d", "Dogwood")]);
        assert_eq!(list.next_page(), 3);

        list.remove_key("a");
        list.remove_key("b");
        list.remove_key("c");

        // The backend now serves d, e on page 1 and f on page 2
        assert_eq!(list.next_page(), 1);
        list.append_page(vec![user("d", "Dogwood"), user("e", "Elm")]);
        list.append_page(vec![user("f", "Fir")]);

        let keys: Vec<&str> = list.items().iter().map(Keyed::key).collect();
        assert_eq!(keys, ["d", "e", "f"]);
        assert!(!list.has_more());
    }

    #[test]
    fn test_default_is_unloaded() {
        let list: LoadedList<User> = LoadedList::default();
        assert!(list.is_unloaded());
        assert_eq!(list.next_page(), 1);
    }
}
