//! Logging setup: console output plus an optional log file.

use fs_err as fs;
use std::env;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const DEBUG_ENV: &str = "PARITY_SCRIPTER_DEBUG_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Timestamp, level, target and fields on one line
    Full,
    /// Shorter single-line output
    Compact,
    /// Multi-line, human-oriented output
    Pretty,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log file path has no file name: {0}")]
    InvalidLogFile(PathBuf),

    #[error("Failed to create log directory: {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    Appender(String),

    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}

/// Installs the global subscriber. Hold the returned guard until exit so
/// buffered file output is flushed.
pub fn init(
    format: LogFormat,
    verbose: bool,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let console = console_layer(format);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(filter(verbose))
        .try_init()
        .map_err(|err| LoggingError::Init(err.to_string()))?;

    Ok(guard)
}

fn console_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Full => fmt::layer().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    }
}

fn filter(verbose: bool) -> EnvFilter {
    if verbose || debug_env_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn debug_env_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidLogFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|source| LoggingError::LogDir {
        path: dir.clone(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(&dir)
        .map_err(|err| LoggingError::Appender(err.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}
