//! Coordinate module
//!
//! Provides the [`Coordinate`] value shared by every component and the
//! haversine distance used to gate registrations and filter nearby results.

mod distance;
mod types;

pub use distance::{distance_meters, EARTH_RADIUS_M};
pub use types::{Coordinate, CoordError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Meters spanned by one degree of latitude on the mean-radius sphere.
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Returns the coordinate `meters` due north (negative = south) of `origin`.
///
/// Movement along a meridian makes the haversine distance equal to the
/// requested offset, which is what map fixtures and the CLI demo need.
pub fn offset_north(origin: &Coordinate, meters: f64) -> Coordinate {
    Coordinate {
        latitude: origin.latitude + meters / METERS_PER_DEGREE_LAT,
        ..*origin
    }
}
