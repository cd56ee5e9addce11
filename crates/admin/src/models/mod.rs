//! Types the admin keeps in its session record.

pub mod session;

pub use session::{CurrentAdmin, keys};
