//! Typed configuration keys for `config get|set|list`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::coord::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use super::{ConfigError, ConfigFile};

/// Every settable `section.key` in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    StoreUrl,
    StoreApiKey,
    LocationHighAccuracy,
    LocationTimeoutMs,
    LocationMaxCacheAgeMs,
    GeofenceRadiusM,
    NearbyRadiusM,
    NearbyRequeryDistanceM,
    MapDefaultLat,
    MapDefaultLng,
    RatingUserId,
    LoggingLevel,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 13] = [
    ConfigKey::StoreUrl,
    ConfigKey::StoreApiKey,
    ConfigKey::LocationHighAccuracy,
    ConfigKey::LocationTimeoutMs,
    ConfigKey::LocationMaxCacheAgeMs,
    ConfigKey::GeofenceRadiusM,
    ConfigKey::NearbyRadiusM,
    ConfigKey::NearbyRequeryDistanceM,
    ConfigKey::MapDefaultLat,
    ConfigKey::MapDefaultLng,
    ConfigKey::RatingUserId,
    ConfigKey::LoggingLevel,
    ConfigKey::LoggingDirectory,
];

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Validate a level or a filter directive list such as `info,proxima=debug`.
///
/// Every directive must name a level, so a stray word is not taken as a
/// target. Bare levels are lowercased.
fn log_filter(value: &str) -> Result<String, String> {
    let value = value.trim();
    if LOG_LEVELS.contains(&value.to_ascii_lowercase().as_str()) {
        return Ok(value.to_ascii_lowercase());
    }
    for directive in value.split(',').map(str::trim) {
        let level = directive.rsplit_once('=').map_or(directive, |(_, level)| level);
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(format!(
                "'{}' is not a level or target=level directive",
                directive
            ));
        }
    }
    EnvFilter::try_new(value).map_err(|e| e.to_string())?;
    Ok(value.to_string())
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::StoreUrl => "store.url",
            ConfigKey::StoreApiKey => "store.api_key",
            ConfigKey::LocationHighAccuracy => "location.high_accuracy",
            ConfigKey::LocationTimeoutMs => "location.timeout_ms",
            ConfigKey::LocationMaxCacheAgeMs => "location.max_cache_age_ms",
            ConfigKey::GeofenceRadiusM => "geofence.radius_m",
            ConfigKey::NearbyRadiusM => "nearby.radius_m",
            ConfigKey::NearbyRequeryDistanceM => "nearby.requery_distance_m",
            ConfigKey::MapDefaultLat => "map.default_lat",
            ConfigKey::MapDefaultLng => "map.default_lng",
            ConfigKey::RatingUserId => "rating.user_id",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingDirectory => "logging.directory",
        }
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        self.split().0
    }

    /// Key name within the section.
    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or((name, ""))
    }

    /// Current value as a string; empty when an optional value is unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::StoreUrl => config.store.url.clone().unwrap_or_default(),
            ConfigKey::StoreApiKey => config.store.api_key.clone().unwrap_or_default(),
            ConfigKey::LocationHighAccuracy => config.location.high_accuracy.to_string(),
            ConfigKey::LocationTimeoutMs => config.location.timeout_ms.to_string(),
            ConfigKey::LocationMaxCacheAgeMs => config.location.max_cache_age_ms.to_string(),
            ConfigKey::GeofenceRadiusM => config.geofence.radius_m.to_string(),
            ConfigKey::NearbyRadiusM => config.nearby.radius_m.to_string(),
            ConfigKey::NearbyRequeryDistanceM => config.nearby.requery_distance_m.to_string(),
            ConfigKey::MapDefaultLat => config.map.default_lat.to_string(),
            ConfigKey::MapDefaultLng => config.map.default_lng.to_string(),
            ConfigKey::RatingUserId => config.rating.user_id.clone(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse and store `value`. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::StoreUrl => config.store.url = optional(value),
            ConfigKey::StoreApiKey => config.store.api_key = optional(value),
            ConfigKey::LocationHighAccuracy => {
                config.location.high_accuracy = self.parse_bool(value)?
            }
            ConfigKey::LocationTimeoutMs => config.location.timeout_ms = self.parse_u64(value)?,
            ConfigKey::LocationMaxCacheAgeMs => {
                config.location.max_cache_age_ms = self.parse_u64(value)?
            }
            ConfigKey::GeofenceRadiusM => config.geofence.radius_m = self.parse_meters(value)?,
            ConfigKey::NearbyRadiusM => config.nearby.radius_m = self.parse_meters(value)?,
            ConfigKey::NearbyRequeryDistanceM => {
                config.nearby.requery_distance_m = self.parse_meters(value)?
            }
            ConfigKey::MapDefaultLat => {
                config.map.default_lat = self.parse_degrees(value, MIN_LAT, MAX_LAT)?
            }
            ConfigKey::MapDefaultLng => {
                config.map.default_lng = self.parse_degrees(value, MIN_LON, MAX_LON)?
            }
            ConfigKey::RatingUserId => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.rating.user_id = value.to_string();
            }
            ConfigKey::LoggingLevel => {
                config.logging.level =
                    log_filter(value).map_err(|reason| self.invalid(value, reason))?;
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = optional(value).map(PathBuf::from)
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_u64(&self, value: &str) -> Result<u64, ConfigError> {
        value
            .parse()
            .map_err(|_| self.invalid(value, "expected a whole number"))
    }

    fn parse_meters(&self, value: &str) -> Result<f64, ConfigError> {
        let meters: f64 = value
            .parse()
            .map_err(|_| self.invalid(value, "expected a number of meters"))?;
        if !meters.is_finite() || meters < 0.0 {
            return Err(self.invalid(value, "must be a non-negative distance"));
        }
        Ok(meters)
    }

    fn parse_degrees(&self, value: &str, min: f64, max: f64) -> Result<f64, ConfigError> {
        let degrees: f64 = value
            .parse()
            .map_err(|_| self.invalid(value, "expected degrees"))?;
        if !degrees.is_finite() || !(min..=max).contains(&degrees) {
            return Err(self.invalid(value, format!("must be between {} and {}", min, max)));
        }
        Ok(degrees)
    }
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
