//! Nearby command - one spatial query against the configured store.

use proxima::coord::distance_meters;

use super::common::{build_store, format_distance, resolve_center};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the nearby command.
pub struct NearbyArgs {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub verbose: bool,
}

/// Run the nearby command.
pub fn run(args: NearbyArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("nearby");
    let config = runner.config();

    let center = resolve_center(args.lat, args.lng, config)?;
    let radius = args.radius.unwrap_or(config.nearby.radius_m);
    if !radius.is_finite() || radius < 0.0 {
        return Err(CliError::Input(format!("radius must be non-negative, got {}", radius)));
    }
    let store = build_store(config)?;

    let businesses = runner.block_on(store.nearby_businesses(
        center.latitude,
        center.longitude,
        radius,
    ))?;

    println!(
        "{} businesses within {} of {}",
        businesses.len(),
        format_distance(radius),
        center
    );
    if businesses.is_empty() {
        return Ok(());
    }
    println!();

    for business in &businesses {
        let distance = distance_meters(&center, &business.coordinate);
        let informal = if business.is_informal { ", informal" } else { "" };
        println!(
            "  {:>9}  {}  [{}{}]  id={}",
            format_distance(distance),
            business.name,
            business.category,
            informal,
            business.id
        );
        if let Some(description) = &business.description {
            println!("             {}", description);
        }
    }

    Ok(())
}
