//! Transient user notifications

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }
}

/// Receives notifications produced by user actions
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => error!("{}", notification.message),
            _ => info!("{}", notification.message),
        }
    }
}

/// Keeps notifications around until their lifetime runs out
pub struct NotificationCenter {
    ttl: Duration,
    entries: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Notifications still visible now
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Utc::now())
    }

    /// Notifications still visible at `now`; expired ones are dropped
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let ttl =
            chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        let mut entries = self.entries.lock();
        entries.retain(|n| now - n.created_at < ttl);
        entries.clone()
    }

    /// Notifications received since the last prune, expired or not
    pub fn history(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        LogNotifier.notify(notification.clone());
        self.entries.lock().push(notification);
    }
}
