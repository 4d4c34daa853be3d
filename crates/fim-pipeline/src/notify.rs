//! User-facing notifications raised by the pipeline.
//!
//! Failures never escape as panics; they degrade to "nothing displayed"
//! plus one of these, delivered to a [`Notifier`].

use std::sync::Mutex;
use std::time::Duration;

use fim_common::{FimError, ReachId};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

/// A transient, closable alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: AlertLevel,
    pub title: String,
    pub text: String,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl Notification {
    pub fn new(level: AlertLevel, title: impl Into<String>, text: impl Into<String>, secs: u64) -> Self {
        Self {
            level,
            title: title.into(),
            text: text.into(),
            duration: Duration::from_secs(secs),
        }
    }

    /// No raster is cataloged for the requested stage.
    pub fn no_files_for_stage(reach: &ReachId, stage: f64) -> Self {
        Self::new(
            AlertLevel::Warning,
            "Stage Selection",
            format!(
                "No COGs found for reach: {} with selected stage: {}m.",
                reach, stage
            ),
            3,
        )
    }

    /// One raster of a batch failed; siblings are unaffected.
    pub fn cog_failed(url: &str, err: &FimError) -> Self {
        Self::new(
            AlertLevel::Error,
            "Error Loading COG",
            format!("Failed to load COG {}: {}", url, err),
            5,
        )
    }

    pub fn catalog_failed(err: &FimError) -> Self {
        Self::new(
            AlertLevel::Error,
            err.notification_title(),
            format!("Failed to load flood maps: {}", err),
            5,
        )
    }

    pub fn no_quantiles(reach: &ReachId) -> Self {
        Self::new(
            AlertLevel::Info,
            "Quantiles",
            format!("No historical quantiles available for reach {}.", reach),
            3,
        )
    }

    pub fn quantiles_failed(reach: &ReachId, err: &FimError) -> Self {
        Self::new(
            AlertLevel::Error,
            "Quantiles",
            format!("Failed to load quantiles for reach {}: {}", reach, err),
            5,
        )
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

/// Sink for notifications (a toast area in a UI, a log in a CLI).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        let secs = n.duration.as_secs();
        match n.level {
            AlertLevel::Info => info!(title = %n.title, duration_secs = secs, "{}", n.text),
            AlertLevel::Warning => warn!(title = %n.title, duration_secs = secs, "{}", n.text),
            AlertLevel::Error => error!(title = %n.title, duration_secs = secs, "{}", n.text),
        }
    }
}

/// Keeps every notification, for tests and batch reports.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.received.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}
