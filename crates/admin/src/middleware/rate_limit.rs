//! Rate limiting for the admin login form.

use std::sync::Arc;

use governor::middleware::NoOpMiddleware;
use governor::clock::QuantaInstant;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Login attempts: 1 token every 10 seconds, burst of 5, keyed by peer IP.
///
/// The admin binds to a private address, so the socket peer is the client.
///
/// # Panics
///
/// Does not panic: both settings are non-zero constants.
#[must_use]
#[allow(clippy::expect_used)]
pub fn login_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(PeerIpKeyExtractor)
        .per_second(10)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(10) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}
