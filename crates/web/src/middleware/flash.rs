//! One-shot flash notices carried across a redirect in the session.

use tower_sessions::Session;

use crate::models::session::{Flash, FlashLevel, keys};

/// Store a notice to be shown on the next rendered page.
///
/// A later notice replaces an earlier unread one.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(
    session: &Session,
    level: FlashLevel,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::FLASH, Flash::new(level, message)).await
}

/// Remove and return the pending notice, if any.
///
/// Session store failures are logged and treated as "no notice".
pub async fn take_flash(session: &Session) -> Option<Flash> {
    match session.remove::<Flash>(keys::FLASH).await {
        Ok(flash) => flash,
        Err(e) => {
            tracing::warn!("Failed to read flash notice: {e}");
            None
        }
    }
}
