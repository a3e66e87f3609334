//! Fire-and-forget user notifications ("toasts").

use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// How long the presentation layer keeps a toast on screen.
pub const TOAST_TIMEOUT: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub text: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

/// Where notifications go. Passed in explicitly; there is no global bus.
pub trait NotificationBus {
    fn notify(&mut self, note: Notification);
}

/// Keeps everything in memory, oldest first.
#[derive(Debug, Default)]
pub struct CollectingBus {
    pub notes: Vec<Notification>,
}

impl NotificationBus for CollectingBus {
    fn notify(&mut self, note: Notification) {
        self.notes.push(note);
    }
}

/// Forwards to `tracing`; what the CLI uses.
#[derive(Debug, Default)]
pub struct LogBus;

impl NotificationBus for LogBus {
    fn notify(&mut self, note: Notification) {
        match note.severity {
            Severity::Error => error!(text = %note.text, "notification"),
            Severity::Success | Severity::Info => info!(text = %note.text, severity = ?note.severity, "notification"),
        }
    }
}
