//! Tracing subscriber setup
//!
//! Installs a global `tracing` subscriber with:
//!
//! - an [`EnvFilter`] taken from `RUST_LOG`, falling back to the configured level
//! - a stderr layer with local RFC 3339 timestamps
//! - an optional daily-rolling file layer behind a non-blocking writer
//!
//! Hold the returned [`LoggingGuard`] for the life of the process; dropping
//! it flushes and closes the file writer.
//!
//! ```ignore
//! let config = ConfigFile::load()?;
//! let _guard = proxima::logging::init(&LoggingConfig::from(&config.logging))?;
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSettings;

/// File name prefix for daily log files.
pub const LOG_FILE_PREFIX: &str = "proxima.log";

/// Errors from installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Logging setup.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `info`,
    /// `proxima=debug`).
    pub level: String,
    /// Directory for daily log files.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Filter from `RUST_LOG` when set and valid, else from `level`.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| LoggingError::InvalidFilter {
            filter: self.level.clone(),
            message: e.to_string(),
        })
    }
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            directory: settings.directory.clone(),
        }
    }
}

/// Keeps the non-blocking file writer alive.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    file: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// True when a file layer is installed.
    pub fn has_file_output(&self) -> bool {
        self.file.is_some()
    }
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = config.env_filter()?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    let (file_layer, file_guard) = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::debug!(
        level = %config.level,
        file = file_guard.is_some(),
        "Logging initialized"
    );

    Ok(LoggingGuard { file: file_guard })
}
