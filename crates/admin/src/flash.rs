//! One-shot notices shown on the next rendered page.

use fernhouse_core::Notice;
use tower_sessions::Session;
use tracing::warn;

use crate::models::keys;

/// Queue `notice` for the next page.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn push_notice(
    session: &Session,
    notice: Notice,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::FLASH, notice).await
}

/// Take the queued notice, if any.
pub async fn take_notice(session: &Session) -> Option<Notice> {
    match session.remove::<Notice>(keys::FLASH).await {
        Ok(notice) => notice,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable notice");
            None
        }
    }
}
