//! User-visible notices (toasts)
//!
//! Components never talk to a global toast queue; they receive a
//! [`Notifier`] and push [`Notice`]s through it. Implementations:
//! - [`TracingNotifier`]: writes notices to the log
//! - [`DesktopNotifier`]: desktop notification via notify-rust
//! - [`MemoryNotifier`]: keeps notices in memory for inspection
//! - [`FanoutNotifier`]: forwards to several notifiers

use crate::config::NotificationConfig;
use chrono::{DateTime, Utc};
use notify_rust::{Notification, Timeout};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Visual weight of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    #[default]
    Default,
    Destructive,
}

/// A single user-visible notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
            at: Utc::now(),
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: NoticeVariant::Destructive,
            ..Self::new(title, description)
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

/// Capability for showing notices to the user
///
/// SOS transitions hand their notices over only after the controller lock
/// has been released, so implementations may read SOS state.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

/// Writes notices to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        if notice.is_destructive() {
            tracing::warn!(title = %notice.title, "{}", notice.description);
        } else {
            tracing::info!(title = %notice.title, "{}", notice.description);
        }
    }
}

/// Shows notices as desktop notifications
pub struct DesktopNotifier {
    config: NotificationConfig,
}

impl DesktopNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) {
        if !self.config.enabled {
            return;
        }

        let timeout_ms = self.config.timeout_seconds.saturating_mul(1000);
        let result = Notification::new()
            .summary(&notice.title)
            .body(&notice.description)
            .timeout(Timeout::Milliseconds(
                u32::try_from(timeout_ms).unwrap_or(u32::MAX),
            ))
            .show();

        if let Err(e) = result {
            tracing::warn!("Failed to show desktop notification: {}", e);
        }
    }
}

/// Keeps every notice it receives
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all notices received so far, oldest first
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.title).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}

/// Forwards every notice to each inner notifier in order
#[derive(Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: Arc<dyn Notifier>) -> Self {
        self.targets.push(target);
        self
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, notice: &Notice) {
        for target in &self.targets {
            target.notify(notice);
        }
    }
}
