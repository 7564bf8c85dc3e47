//! Voice announcements and notifications.
//!
//! Delivery is best-effort. Callers log failures and carry on; an
//! [`AnnounceError`] never stops navigation.

use thiserror::Error;

/// Failure to deliver an announcement or notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnounceError {
    /// The speech or notification channel is not available.
    #[error("announcement channel unavailable: {0}")]
    Unavailable(String),
    /// The user has not granted permission for notifications.
    #[error("notification permission denied")]
    PermissionDenied,
}

/// Side-effect sink for navigation events.
pub trait Announcer: Send + Sync {
    /// Speak `text` to the driver.
    ///
    /// # Errors
    ///
    /// Returns [`AnnounceError`] when speech could not be delivered.
    fn announce(&self, text: &str) -> Result<(), AnnounceError>;

    /// Show a notification with `title` and `body`.
    ///
    /// # Errors
    ///
    /// Returns [`AnnounceError`] when the notification could not be shown.
    fn notify(&self, title: &str, body: &str) -> Result<(), AnnounceError>;
}

/// Announcer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn announce(&self, _text: &str) -> Result<(), AnnounceError> {
        Ok(())
    }

    fn notify(&self, _title: &str, _body: &str) -> Result<(), AnnounceError> {
        Ok(())
    }
}
