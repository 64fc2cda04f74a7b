//! Business registration and rating submission
//!
//! Registration is gated by a [`GeofenceSession`](crate::geofence::GeofenceSession):
//! a business can only be created at a point the session has accepted.
//! Ratings carry a caller-resolved user id.

mod business;
mod rating;

use thiserror::Error;

use crate::store::StoreError;

pub use business::{register_business, BusinessDraft, MIN_NAME_CHARS};
pub use rating::{submit_rating, RatingDraft};

/// Errors from submitting a business or rating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionError {
    /// Draft failed local validation; nothing was sent.
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    /// Registration attempted without an accepted geofence pick.
    #[error("business location has not been accepted by the geofence")]
    LocationNotAccepted,

    /// The remote store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
