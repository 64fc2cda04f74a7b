//! Application error types.

use std::fmt;

use crate::geofence::GeofenceError;
use crate::location::LocationError;
use crate::nearby::QueryFailed;
use crate::submission::SubmissionError;

/// Errors surfaced by [`ProximityApp`](super::ProximityApp).
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// An operation needed the live position but no fix has arrived yet.
    NoPosition,

    /// Geofence session misuse or bad radius.
    Geofence(GeofenceError),

    /// A one-shot location request failed.
    Location(LocationError),

    /// The latest nearby query failed.
    Query(QueryFailed),

    /// Registering a business or submitting a rating failed.
    Submission(SubmissionError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoPosition => write!(f, "Current position is not known yet"),
            AppError::Geofence(e) => write!(f, "Geofence error: {}", e),
            AppError::Location(e) => write!(f, "Location error: {}", e.user_message()),
            AppError::Query(e) => write!(f, "Nearby search failed: {}", e),
            AppError::Submission(e) => write!(f, "Submission failed: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Geofence(e) => Some(e),
            AppError::Location(e) => Some(e),
            AppError::Query(e) => Some(e),
            AppError::Submission(e) => Some(e),
            AppError::NoPosition | AppError::Config(_) => None,
        }
    }
}

impl From<GeofenceError> for AppError {
    fn from(e: GeofenceError) -> Self {
        AppError::Geofence(e)
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::Location(e)
    }
}

impl From<QueryFailed> for AppError {
    fn from(e: QueryFailed) -> Self {
        AppError::Query(e)
    }
}

impl From<SubmissionError> for AppError {
    fn from(e: SubmissionError) -> Self {
        AppError::Submission(e)
    }
}
