//! Notifier port - outbound user-facing notifications

use crate::domain::Notification;

/// Receives notification requests (toasts) from the engine.
///
/// Implementations render or queue them; the engine never renders.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
