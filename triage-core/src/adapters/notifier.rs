//! Notifier adapters

use std::sync::Mutex;

use tracing::{info, warn};

use crate::domain::{Notification, NotificationLevel};
use crate::ports::Notifier;

/// Keeps notifications in memory until the view drains them
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pending: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(notification),
            Err(e) => warn!(error = %e, "notification dropped"),
        }
    }
}

/// Forwards notifications to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                info!(operation = %notification.operation, "{}", notification.message)
            }
            NotificationLevel::Error => warn!(
                operation = %notification.operation,
                recovery = ?notification.recovery,
                "{}",
                notification.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Operation;

    #[test]
    fn test_drain_empties_queue() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::success(Operation::CreateRule, "Rule created."));
        notifier.notify(Notification::failure(Operation::FetchRules, "Couldn't load rules."));
        assert_eq!(notifier.len(), 2);

        let drained = notifier.drain();
        assert_eq!(drained[0].operation, Operation::CreateRule);
        assert!(notifier.is_empty());
    }
}
