//! CLI error types.

use std::fmt;

use proxima::app::AppError;
use proxima::config::ConfigError;
use proxima::logging::LoggingError;
use proxima::store::StoreError;
use proxima::submission::SubmissionError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration missing or invalid.
    Config(String),

    /// Logging could not be set up.
    Logging(LoggingError),

    /// The remote store failed.
    Store(StoreError),

    /// Registration or rating failed.
    Submission(SubmissionError),

    /// The proximity session failed.
    App(AppError),

    /// The picked location is outside the geofence.
    PickRejected(String),

    /// Bad command-line or stdin input.
    Input(String),

    /// I/O error (stdin, runtime creation).
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Store(e) => write!(f, "Store error: {}", e),
            CliError::Submission(e) => write!(f, "{}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::PickRejected(msg) => write!(f, "Location rejected: {}", msg),
            CliError::Input(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Submission(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Config(_) | CliError::PickRejected(_) | CliError::Input(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<SubmissionError> for CliError {
    fn from(e: SubmissionError) -> Self {
        CliError::Submission(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
