//! Notifications
//!
//! One short-lived message at a time. A newer message replaces the current
//! one; every message disappears on its own after the configured TTL.

mod notifier;

pub use notifier::{Notification, NotificationConfig, NotificationKind, Notifier};
