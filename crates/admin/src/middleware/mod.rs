//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. Security headers (stricter CSP for admin)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Request ID
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Login rate limit (governor, `POST /auth/login` only)
//!
//! Protected handlers take [`RequireAdminAuth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdminAuth, current_admin};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
