//! Error types for parity-core operations.

use std::path::PathBuf;

/// Errors raised while reading host state or configuration.
///
/// Container and notification failures are not part of this enum: they are
/// reported through [`ActionError`] and handled where the action is dispatched.
#[derive(Debug, thiserror::Error)]
pub enum ParityError {
    // ─────────────────────────────────────────────────────────────────────
    // Status Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Status source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Status malformed: {key}: {details}")]
    MalformedStatus { key: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },
}

impl ParityError {
    /// True for failures of a single status read, which the monitor may retry.
    pub fn is_status_error(&self) -> bool {
        matches!(
            self,
            ParityError::SourceUnavailable { .. } | ParityError::MalformedStatus { .. }
        )
    }
}

/// Failure of a single container action or host command.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` failed ({status}): {details}")]
    CommandFailed {
        command: String,
        status: String,
        details: String,
    },
}

/// Convenience type alias for Results using ParityError.
pub type Result<T> = std::result::Result<T, ParityError>;
