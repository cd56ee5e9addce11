//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Security headers
//! 3. `TraceLayer` (request spans)
//! 4. Request ID (recorded in the span and the Sentry scope)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rate limiting on auth and checkout routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::RequireAuth;
pub use rate_limit::{auth_rate_limiter, checkout_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
