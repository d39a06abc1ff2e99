//! Parity check status as exposed by the Unraid web UI.
//!
//! emhttp keeps the array state in `/var/local/emhttp/var.ini`, one
//! `key="value"` pair per line. Three keys drive parity detection:
//!
//! ```text
//! mdState      STARTED | STOPPED | ...   array state
//! mdResync     0 when idle or paused     total size of the running pass
//! mdResyncPos  0 when idle               cursor within the pass
//! ```
//!
//! Running when `mdResync > 0`, paused when `mdResync == 0` on a started
//! array, stopped when the array reports `stopped`.

use fs_err as fs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ParityError, Result};

pub const DEFAULT_STATUS_FILE: &str = "/var/local/emhttp/var.ini";

const KEY_STATE: &str = "mdState";
const KEY_RESYNC: &str = "mdResync";
const KEY_RESYNC_POS: &str = "mdResyncPos";

/// Key/value pairs read from the status file. Last write wins per key.
pub type RawStatus = HashMap<String, String>;

/// Anything that can produce a fresh status snapshot.
pub trait StatusSource {
    fn read_raw(&self) -> Result<RawStatus>;

    /// Reads and derives in one step.
    fn read_status(&self) -> Result<DerivedStatus> {
        let raw = self.read_raw()?;
        DerivedStatus::derive(&raw)
    }
}

#[derive(Debug, Clone)]
pub struct FileStatusSource {
    path: PathBuf,
}

impl FileStatusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStatusSource {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_FILE)
    }
}

impl StatusSource for FileStatusSource {
    fn read_raw(&self) -> Result<RawStatus> {
        tracing::debug!(path = %self.path.display(), "Reading parity status");
        let bytes = fs::read(&self.path).map_err(|source| ParityError::SourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        // Invalid UTF-8 in unrelated keys must not block detection.
        let raw = parse_status(&String::from_utf8_lossy(&bytes));
        tracing::debug!(keys = raw.len(), "Parsed parity status");
        Ok(raw)
    }
}

/// Parses `key="value"` lines. Lines without `=` are skipped.
pub fn parse_status(text: &str) -> RawStatus {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.to_string(), value.trim_end().replace('"', "")))
        })
        .collect()
}

/// Coarse classification of one status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityState {
    Stopped,
    Running,
    Paused,
    Unknown,
}

impl std::fmt::Display for ParityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ParityState::Stopped => "stopped",
            ParityState::Running => "running",
            ParityState::Paused => "paused",
            ParityState::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Values derived from a single read. Never cached between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStatus {
    /// Lowercased `mdState`.
    pub state: String,
    /// `mdResync`; non-zero while a pass is actively resyncing.
    pub running_total: i64,
    /// `mdResyncPos`; cursor within the pass.
    pub progress: i64,
}

impl DerivedStatus {
    pub fn derive(raw: &RawStatus) -> Result<Self> {
        let state = required(raw, KEY_STATE)?.to_lowercase();
        let running_total = required_int(raw, KEY_RESYNC)?;
        let progress = required_int(raw, KEY_RESYNC_POS)?;

        tracing::debug!(
            state = %state,
            running_total,
            progress,
            "Derived parity status"
        );

        Ok(Self {
            state,
            running_total,
            progress,
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.state == "stopped"
    }

    pub fn is_running(&self) -> bool {
        self.state == "started" && self.running_total > 0 && self.progress >= 0
    }

    pub fn is_paused(&self) -> bool {
        self.state == "started" && self.running_total == 0 && self.progress >= 0
    }

    pub fn classification(&self) -> ParityState {
        if self.is_stopped() {
            ParityState::Stopped
        } else if self.is_running() {
            ParityState::Running
        } else if self.is_paused() {
            ParityState::Paused
        } else {
            ParityState::Unknown
        }
    }
}

fn required<'a>(raw: &'a RawStatus, key: &str) -> Result<&'a str> {
    raw.get(key)
        .map(String::as_str)
        .ok_or_else(|| ParityError::MalformedStatus {
            key: key.to_string(),
            details: "missing from status".to_string(),
        })
}

fn required_int(raw: &RawStatus, key: &str) -> Result<i64> {
    let value = required(raw, key)?;
    value
        .trim()
        .parse()
        .map_err(|err| ParityError::MalformedStatus {
            key: key.to_string(),
            details: format!("expected integer, got {:?}: {}", value, err),
        })
}
