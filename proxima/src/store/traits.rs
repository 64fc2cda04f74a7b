//! Core trait for the remote business store.
//!
//! The `RemoteStore` trait is the only way this library talks to the backend.
//! Spatial filtering and ordering happen server-side; the library treats every
//! call as an opaque asynchronous operation that can fail.
//!
//! # Dyn Compatibility
//!
//! Methods return [`BoxFuture`] so the store can be passed around as
//! `Arc<dyn RemoteStore>` and replaced by a fake in tests.

use thiserror::Error;

use crate::BoxFuture;

use super::types::{Business, NewBusiness, NewRating};

/// Errors returned by remote store calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode store response: {0}")]
    Decode(String),

    /// The store refused the request (validation, missing reference).
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The store is not configured (e.g. no URL).
    #[error("store not configured: {0}")]
    NotConfigured(String),
}

/// Remote business store.
pub trait RemoteStore: Send + Sync {
    /// Businesses within `radius_meters` of the point, nearest first.
    fn nearby_businesses(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> BoxFuture<'_, Result<Vec<Business>, StoreError>>;

    /// Create a business and return its id.
    fn create_business(&self, business: NewBusiness) -> BoxFuture<'_, Result<String, StoreError>>;

    /// Record a rating and return its id.
    fn add_rating(&self, rating: NewRating) -> BoxFuture<'_, Result<String, StoreError>>;
}
