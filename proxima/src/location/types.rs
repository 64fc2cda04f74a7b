//! Location error taxonomy, request options, and tracker state.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Default time the platform may take to produce a fix.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default maximum age of a cached fix (0 = always a fresh fix).
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::ZERO;

/// Failures reported by the location platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable")]
    Unavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("unknown location error")]
    Unknown,
}

impl LocationError {
    /// Map a platform error code to the taxonomy.
    ///
    /// Codes follow the geolocation convention: 1 = permission denied,
    /// 2 = position unavailable, 3 = timeout.
    pub fn from_platform_code(code: u16) -> Self {
        match code {
            1 => LocationError::PermissionDenied,
            2 => LocationError::Unavailable,
            3 => LocationError::Timeout,
            _ => LocationError::Unknown,
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "User denied the request for Geolocation.",
            LocationError::Unavailable => "Location information is unavailable.",
            LocationError::Timeout => "The request to get user location timed out.",
            LocationError::Unknown => "An unknown error occurred.",
        }
    }
}

/// Options passed to the platform for both continuous and one-shot requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    /// Ask for the most accurate fix the device can produce.
    pub high_accuracy: bool,
    /// Maximum time to wait for each fix.
    pub timeout: Duration,
    /// Maximum age of a cached fix the platform may return.
    pub max_cache_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
            max_cache_age: DEFAULT_MAX_CACHE_AGE,
        }
    }
}

/// Lifecycle of the continuous location subscription.
///
/// There is no terminal state: the tracker can be restarted indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    #[default]
    Idle,
    Watching,
    Errored(LocationError),
}

impl TrackingState {
    pub fn is_watching(&self) -> bool {
        matches!(self, TrackingState::Watching)
    }

    pub fn error(&self) -> Option<LocationError> {
        match self {
            TrackingState::Errored(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingState::Idle => write!(f, "idle"),
            TrackingState::Watching => write!(f, "watching"),
            TrackingState::Errored(e) => write!(f, "errored ({})", e),
        }
    }
}
