//! Alert sinks.

use crate::ports::{AlertSeverity, AlertSink};
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Writes alerts to the log. Used by headless nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn show_alert(&self, message: &str, severity: AlertSeverity) {
        match severity {
            AlertSeverity::Error => error!(%severity, "{message}"),
            AlertSeverity::Warning => warn!(%severity, "{message}"),
            AlertSeverity::Info | AlertSeverity::Success => info!(%severity, "{message}"),
        }
    }
}

/// One alert captured by `RecordingAlertSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAlert {
    /// Alert text.
    pub message: String,
    /// Alert severity.
    pub severity: AlertSeverity,
}

/// Keeps every alert in memory, for tests and UI bridges that poll.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<RecordedAlert>>,
}

impl RecordingAlertSink {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All alerts so far, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<RecordedAlert> {
        self.alerts.lock().clone()
    }

    /// Number of alerts so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    /// True if nothing was shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }
}

impl AlertSink for RecordingAlertSink {
    fn show_alert(&self, message: &str, severity: AlertSeverity) {
        self.alerts.lock().push(RecordedAlert {
            message: message.to_owned(),
            severity,
        });
    }
}
