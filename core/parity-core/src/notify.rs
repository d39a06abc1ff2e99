//! Web UI notifications through the Unraid `notify` script.
//!
//! ```text
//! notify [-e "event"] [-s "subject"] [-d "description"]
//!        [-i "normal|warning|alert"] [-m "message"]
//! ```

use std::path::{Path, PathBuf};

use crate::command::run_checked;

pub const DEFAULT_NOTIFY_SCRIPT: &str = "/usr/local/emhttp/webGui/scripts/notify";
pub const DEFAULT_NOTIFY_EVENT: &str = "Parity Scripter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
    Alert,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
        }
    }
}

/// Delivery is best effort: implementations log failures and never return them.
pub trait Notifier {
    fn send(&self, severity: Severity, subject: &str, message: &str, long_message: &str);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn send(&self, severity: Severity, subject: &str, message: &str, long_message: &str) {
        (**self).send(severity, subject, message, long_message)
    }
}

#[derive(Debug, Clone)]
pub struct UnraidNotifier {
    script: PathBuf,
    event: String,
}

impl UnraidNotifier {
    pub fn new(script: impl Into<PathBuf>, event: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            event: event.into(),
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl Default for UnraidNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_SCRIPT, DEFAULT_NOTIFY_EVENT)
    }
}

impl Notifier for UnraidNotifier {
    fn send(&self, severity: Severity, subject: &str, message: &str, long_message: &str) {
        tracing::debug!(severity = severity.as_str(), subject, "Sending notification to UI");
        let program = self.script.to_string_lossy();
        let args = [
            "-e".to_string(),
            self.event.clone(),
            "-i".to_string(),
            severity.as_str().to_string(),
            "-s".to_string(),
            subject.to_string(),
            "-d".to_string(),
            html_format(message),
            "-m".to_string(),
            html_format(long_message),
        ];
        if let Err(err) = run_checked(&program, &args) {
            tracing::warn!(error = %err, subject, "Failed to send notification");
        }
    }
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, severity: Severity, subject: &str, _message: &str, _long_message: &str) {
        tracing::debug!(
            severity = severity.as_str(),
            subject,
            "Notifications disabled, dropping"
        );
    }
}

/// Formats text for the notification panel.
pub fn html_format(text: &str) -> String {
    text.replace('\n', "<br>")
        .replace('\t', "    ")
        .replace('"', "")
}
