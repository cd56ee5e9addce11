//! Fernhouse Core - shared types and pure state logic.
//!
//! This crate provides what both Fernhouse binaries share:
//! - `storefront` - customer-facing shop (plants and pots)
//! - `admin` - back-office for catalog, orders and users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no sessions. Every state transition the binaries persist (cart
//! edits, loaded admin lists, checkout phases) is defined here so it can be
//! tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and statuses
//! - [`records`] - Backend records (catalog items, categories, orders, users)
//! - [`cart`] - Cart lines and merge-by-`(id, size)` transitions
//! - [`totals`] - Subtotal / shipping / total arithmetic
//! - [`search`] - Case-insensitive substring filtering
//! - [`listing`] - "Load more" lists
//! - [`checkout`] - Payment-completion state machine
//! - [`auth`] - `{user, token}` session snapshot
//! - [`notice`] - Flash notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod listing;
pub mod notice;
pub mod records;
pub mod search;
pub mod totals;
pub mod types;

pub use auth::AuthSession;
pub use cart::{Cart, CartError, CartItem};
pub use checkout::{CheckoutEvent, CheckoutPhase, FailureStage, IdempotencyKey};
pub use listing::{Keyed, LoadedList};
pub use notice::{Notice, NoticeLevel};
pub use records::{
    Banner, BuyerRef, CatalogItem, CatalogKind, Category, CategoryRef, Order, User,
};
pub use search::Searchable;
pub use totals::OrderTotals;
pub use types::*;
