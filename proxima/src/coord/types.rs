//! Coordinate value type and validation errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors produced when building a coordinate from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid accuracy: {0} (must be a finite, non-negative number of meters)")]
    InvalidAccuracy(f64),
}

/// A geographic position with the accuracy and time of the fix.
///
/// Coordinates come either from the location platform (with a real accuracy
/// and timestamp) or from a point picked on the map, in which case accuracy
/// is zero. The value is immutable once built; updates replace it whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Radius of the 95% confidence circle, in meters.
    pub accuracy_meters: f64,
    /// Unix epoch milliseconds when the fix was taken.
    pub timestamp_ms: i64,
}

impl Coordinate {
    /// Create a coordinate with zero accuracy radius and no timestamp.
    ///
    /// Intended for map picks and fixtures; use [`Coordinate::try_new`] for
    /// values that have not been range-checked.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: 0.0,
            timestamp_ms: 0,
        }
    }

    /// Create a coordinate after validating latitude and longitude ranges.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Build a platform fix: validated position, accuracy, and fix time.
    pub fn fix(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        timestamp_ms: i64,
    ) -> Result<Self, CoordError> {
        if !accuracy_meters.is_finite() || accuracy_meters < 0.0 {
            return Err(CoordError::InvalidAccuracy(accuracy_meters));
        }
        Ok(Self::try_new(latitude, longitude)?
            .with_accuracy(accuracy_meters)
            .with_timestamp_ms(timestamp_ms))
    }

    /// Return a copy with the given accuracy radius.
    pub const fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = accuracy_meters;
        self
    }

    /// Return a copy with the given fix timestamp.
    pub const fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Return a copy stamped with the current wall-clock time.
    pub fn stamped_now(self) -> Self {
        self.with_timestamp_ms(chrono::Utc::now().timestamp_millis())
    }

    /// True when both coordinates name the same point, ignoring accuracy
    /// and timestamp.
    pub fn same_position(&self, other: &Coordinate) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamped_now_keeps_position() {
        let before = chrono::Utc::now().timestamp_millis();
        let stamped = Coordinate::new(19.4, -99.1).with_accuracy(8.0).stamped_now();

        assert!(stamped.timestamp_ms >= before);
        assert_eq!(stamped.accuracy_meters, 8.0);
        assert!(stamped.same_position(&Coordinate::new(19.4, -99.1)));
    }
}
