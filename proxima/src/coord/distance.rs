//! Great-circle distance between coordinates.

use super::types::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two coordinates, in meters.
///
/// Symmetric, and zero exactly when both latitude and longitude match.
/// Accuracy and timestamp are ignored.
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    // abs() keeps the computation bit-for-bit symmetric in (a, b)
    let d_lat = (b.latitude - a.latitude).abs().to_radians();
    let d_lon = (b.longitude - a.longitude).abs().to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let h = sin_lat * sin_lat + lat_a.cos() * lat_b.cos() * sin_lon * sin_lon;

    // Clamp guards sqrt(1 - h) against rounding past 1.0 for antipodes
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}
