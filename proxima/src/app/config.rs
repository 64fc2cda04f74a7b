//! Application configuration for ProximityApp.
//!
//! `AppConfig` gathers the settings the running application needs: location
//! request options, geofence and nearby radii, the fallback map center, and
//! the rating identity.

use std::time::Duration;

use crate::config::ConfigFile;
use crate::coord::Coordinate;
use crate::location::LocationOptions;
use crate::nearby::FollowPolicy;

use super::error::AppError;

/// Default geofence radius in meters.
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 30.0;

/// Default nearby search radius in meters.
pub const DEFAULT_NEARBY_RADIUS_M: f64 = 1_000.0;

/// Default movement before the nearby set is refreshed, in meters.
pub const DEFAULT_REQUERY_DISTANCE_M: f64 = 25.0;

/// Map center used before the first fix (Mexico City).
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(19.4326, -99.1332);

/// User id attached to ratings until authentication exists.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Runtime configuration passed to `ProximityApp::start()`.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Options for both continuous and one-shot location requests.
    pub location: LocationOptions,

    /// Radius a map pick must fall within when registering a business.
    pub geofence_radius_meters: f64,

    /// Radius and re-query threshold of the nearby follower.
    pub nearby: FollowPolicy,

    /// Where the first query goes when no position is known.
    pub default_center: Coordinate,

    /// Identity attached to submitted ratings.
    pub rating_user_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            location: LocationOptions::default(),
            geofence_radius_meters: DEFAULT_GEOFENCE_RADIUS_M,
            nearby: FollowPolicy {
                radius_meters: DEFAULT_NEARBY_RADIUS_M,
                requery_distance_meters: DEFAULT_REQUERY_DISTANCE_M,
            },
            default_center: DEFAULT_CENTER,
            rating_user_id: ANONYMOUS_USER.to_string(),
        }
    }
}

impl AppConfig {
    /// Build the application config from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Result<Self, AppError> {
        let default_center = Coordinate::try_new(config.map.default_lat, config.map.default_lng)
            .map_err(|e| AppError::Config(format!("map center: {}", e)))?;

        let app_config = Self {
            location: LocationOptions {
                high_accuracy: config.location.high_accuracy,
                timeout: Duration::from_millis(config.location.timeout_ms),
                max_cache_age: Duration::from_millis(config.location.max_cache_age_ms),
            },
            geofence_radius_meters: config.geofence.radius_m,
            nearby: FollowPolicy {
                radius_meters: config.nearby.radius_m,
                requery_distance_meters: config.nearby.requery_distance_m,
            },
            default_center,
            rating_user_id: config.rating.user_id.clone(),
        };
        app_config.validate()?;
        Ok(app_config)
    }

    /// Set the geofence radius.
    pub fn with_geofence_radius(mut self, meters: f64) -> Self {
        self.geofence_radius_meters = meters;
        self
    }

    /// Set the nearby search radius.
    pub fn with_nearby_radius(mut self, meters: f64) -> Self {
        self.nearby.radius_meters = meters;
        self
    }

    /// Set the movement threshold for re-querying.
    pub fn with_requery_distance(mut self, meters: f64) -> Self {
        self.nearby.requery_distance_meters = meters;
        self
    }

    /// Set the fallback map center.
    pub fn with_default_center(mut self, center: Coordinate) -> Self {
        self.default_center = center;
        self
    }

    /// Set the location request options.
    pub fn with_location_options(mut self, options: LocationOptions) -> Self {
        self.location = options;
        self
    }

    /// Set the rating identity.
    pub fn with_rating_user(mut self, user_id: impl Into<String>) -> Self {
        self.rating_user_id = user_id.into();
        self
    }

    /// Check that every distance is a finite, non-negative number of meters.
    pub fn validate(&self) -> Result<(), AppError> {
        let distances = [
            ("geofence radius", self.geofence_radius_meters),
            ("nearby radius", self.nearby.radius_meters),
            ("requery distance", self.nearby.requery_distance_meters),
        ];
        for (name, meters) in distances {
            if !meters.is_finite() || meters < 0.0 {
                return Err(AppError::Config(format!(
                    "{} must be a non-negative distance, got {}",
                    name, meters
                )));
            }
        }
        if self.rating_user_id.trim().is_empty() {
            return Err(AppError::Config("rating user id must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.geofence_radius_meters, 30.0);
        assert_eq!(config.nearby.radius_meters, 1_000.0);
        assert_eq!(config.nearby.requery_distance_meters, 25.0);
        assert_eq!(config.location, LocationOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_default_config_file_matches_default() {
        let config = AppConfig::from_config_file(&ConfigFile::default()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_from_config_file_carries_values() {
        let mut file = ConfigFile::default();
        file.geofence.radius_m = 50.0;
        file.nearby.radius_m = 2_000.0;
        file.location.timeout_ms = 10_000;
        file.location.high_accuracy = false;
        file.map.default_lat = 20.6597;
        file.map.default_lng = -103.3496;
        file.rating.user_id = "user-42".to_string();

        let config = AppConfig::from_config_file(&file).unwrap();
        assert_eq!(config.geofence_radius_meters, 50.0);
        assert_eq!(config.nearby.radius_meters, 2_000.0);
        assert_eq!(config.location.timeout, Duration::from_secs(10));
        assert!(!config.location.high_accuracy);
        assert_eq!(config.default_center.latitude, 20.6597);
        assert_eq!(config.rating_user_id, "user-42");
    }

    #[test]
    fn test_from_config_file_rejects_bad_center() {
        let mut file = ConfigFile::default();
        file.map.default_lat = 120.0;
        assert!(matches!(
            AppConfig::from_config_file(&file),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_radius() {
        let config = AppConfig::default().with_geofence_radius(-5.0);
        assert!(config.validate().is_err());

        let config = AppConfig::default().with_nearby_radius(f64::NAN);
        assert!(config.validate().is_err());
    }
}
