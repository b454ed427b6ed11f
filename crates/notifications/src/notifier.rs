//! Notifier Implementation

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long a notification stays visible (milliseconds, default: 3000)
    pub ttl_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { ttl_ms: 3000 }
    }
}

/// Kind of notification, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A message shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip)]
    pub issued_at: Instant,
}

/// Holder of the current notification
#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    current: Mutex<Option<Notification>>,
}

impl Notifier {
    /// Create a notifier
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            ttl: Duration::from_millis(config.ttl_ms),
            current: Mutex::new(None),
        }
    }

    /// Show `message`, replacing whatever is visible
    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            NotificationKind::Error => warn!("Notify [{:?}]: {}", kind, message),
            _ => info!("Notify [{:?}]: {}", kind, message),
        }

        let notification = Notification {
            kind,
            message,
            issued_at: Instant::now(),
        };
        if let Ok(mut current) = self.current.lock() {
            *current = Some(notification);
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(NotificationKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(NotificationKind::Error, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(NotificationKind::Info, message);
    }

    /// The visible notification, if it has not expired yet
    pub fn current(&self) -> Option<Notification> {
        let mut current = self.current.lock().ok()?;
        let expired = current
            .as_ref()
            .map_or(false, |n| n.issued_at.elapsed() >= self.ttl);
        if expired {
            debug!("Notification dismissed");
            *current = None;
        }
        (*current).clone()
    }

    /// Dismiss immediately
    pub fn dismiss(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_after_ttl() {
        let notifier = Notifier::default();
        notifier.success("Upload successful");

        tokio::time::advance(Duration::from_millis(2999)).await;
        let shown = notifier.current().unwrap();
        assert_eq!(shown.kind, NotificationKind::Success);
        assert_eq!(shown.message, "Upload successful");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_replaces_and_restarts_ttl() {
        let notifier = Notifier::default();
        notifier.error("Upload failed");

        tokio::time::advance(Duration::from_secs(2)).await;
        notifier.info("Retrying is up to you");

        tokio::time::advance(Duration::from_secs(2)).await;
        let shown = notifier.current().unwrap();
        assert_eq!(shown.kind, NotificationKind::Info);
    }

    #[test]
    fn test_dismiss() {
        let notifier = Notifier::default();
        notifier.error("Camera not accessible");
        assert!(notifier.current().is_some());

        notifier.dismiss();
        assert!(notifier.current().is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let notifier = Notifier::new(NotificationConfig { ttl_ms: 500 });
        assert_eq!(notifier.ttl(), Duration::from_millis(500));
    }
}
