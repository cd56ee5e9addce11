//! Core types for Fernhouse.
//!
//! Type-safe wrappers for identifiers, prices, emails and statuses.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::*;
