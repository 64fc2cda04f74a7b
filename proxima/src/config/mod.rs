//! Configuration file management
//!
//! Settings live in an INI file at `<config dir>/proxima/config.ini`:
//!
//! ```ini
//! [store]
//! url = https://example.supabase.co
//! api_key = ...
//!
//! [location]
//! high_accuracy = true
//! timeout_ms = 5000
//! max_cache_age_ms = 0
//!
//! [geofence]
//! radius_m = 30
//!
//! [nearby]
//! radius_m = 1000
//! requery_distance_m = 25
//!
//! [map]
//! default_lat = 19.4326
//! default_lng = -99.1332
//!
//! [rating]
//! user_id = anonymous
//!
//! [logging]
//! level = info
//! directory = /var/log/proxima
//! ```
//!
//! A missing file yields defaults. Every value goes through [`ConfigKey`] on
//! both load and `config set`, so the two paths validate identically.

mod keys;

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

pub use keys::ConfigKey;

/// Errors from reading, writing, or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Remote store connection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

/// Options handed to the location platform.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub max_cache_age_ms: u64,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 5_000,
            max_cache_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceSettings {
    pub radius_m: f64,
}

impl Default for GeofenceSettings {
    fn default() -> Self {
        Self { radius_m: 30.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbySettings {
    pub radius_m: f64,
    /// Distance the user must move before the nearby set is refreshed.
    pub requery_distance_m: f64,
}

impl Default for NearbySettings {
    fn default() -> Self {
        Self {
            radius_m: 1_000.0,
            requery_distance_m: 25.0,
        }
    }
}

/// Map center used before the first fix arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub default_lat: f64,
    pub default_lng: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        // Mexico City
        Self {
            default_lat: 19.4326,
            default_lng: -99.1332,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingSettings {
    pub user_id: String,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            user_id: "anonymous".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Directory for daily log files; `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub store: StoreSettings,
    pub location: LocationSettings,
    pub geofence: GeofenceSettings,
    pub nearby: NearbySettings,
    pub map: MapSettings,
    pub rating: RatingSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|s| s.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }
}

/// Directory holding the configuration file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("proxima")
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}
