//! Common types and utilities shared across CLI commands.

use std::sync::Arc;

use proxima::config::ConfigFile;
use proxima::coord::Coordinate;
use proxima::store::{PostgrestConfig, PostgrestStore, RemoteStore};

use crate::error::CliError;

/// Build the remote store from the `[store]` section.
pub fn build_store(config: &ConfigFile) -> Result<Arc<dyn RemoteStore>, CliError> {
    let url = config.store.url.clone().ok_or_else(|| {
        CliError::Config(
            "No store configured. Set it with 'proxima config set store.url <url>' \
             and 'proxima config set store.api_key <key>'"
                .to_string(),
        )
    })?;
    let api_key = config.store.api_key.clone().unwrap_or_default();

    let store = PostgrestStore::new(PostgrestConfig::new(url, api_key))?;
    Ok(Arc::new(store))
}

/// Validate a latitude/longitude pair from the command line.
pub fn coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, CliError> {
    Coordinate::try_new(latitude, longitude).map_err(|e| CliError::Input(e.to_string()))
}

/// Resolve a search center: CLI values first, then the configured map center.
pub fn resolve_center(
    latitude: Option<f64>,
    longitude: Option<f64>,
    config: &ConfigFile,
) -> Result<Coordinate, CliError> {
    coordinate(
        latitude.unwrap_or(config.map.default_lat),
        longitude.unwrap_or(config.map.default_lng),
    )
}

/// Human-friendly distance: meters below 1 km, kilometers above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.2} km", meters / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(12.4), "12 m");
        assert_eq!(format_distance(999.0), "999 m");
        assert_eq!(format_distance(111_195.08), "111.20 km");
    }

    #[test]
    fn test_resolve_center_prefers_cli() {
        let config = ConfigFile::default();
        let center = resolve_center(Some(20.0), None, &config).unwrap();
        assert_eq!(center.latitude, 20.0);
        assert_eq!(center.longitude, config.map.default_lng);
    }

    #[test]
    fn test_build_store_requires_url() {
        let config = ConfigFile::default();
        assert!(matches!(build_store(&config), Err(CliError::Config(_))));
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(matches!(coordinate(0.0, 200.0), Err(CliError::Input(_))));
    }
}
