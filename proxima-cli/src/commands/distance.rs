//! Distance command - great-circle distance between two points.

use proxima::coord::distance_meters;

use super::common::{coordinate, format_distance};
use crate::error::CliError;

/// Run the distance command.
pub fn run(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Result<(), CliError> {
    let a = coordinate(lat1, lng1)?;
    let b = coordinate(lat2, lng2)?;
    let meters = distance_meters(&a, &b);

    println!("{} → {}", a, b);
    println!("{:.2} m ({})", meters, format_distance(meters));
    Ok(())
}
