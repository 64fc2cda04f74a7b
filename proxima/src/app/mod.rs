//! Application bootstrap and lifecycle management.
//!
//! This module provides the `ProximityApp` type which wires the location,
//! nearby, geofence, and marker components together for a map UI shell and
//! tears them down as one unit.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          ProximityApp                             │
//! │                                                                   │
//! │  1. PositionTracker ──coordinates──┬──► nearby follower           │
//! │     └── LocationSource             │     └── NearbyQueryCoordinator
//! │                                    │           └── RemoteStore    │
//! │                                    │                 │            │
//! │  2. MarkerSyncController ◄─────────┴──── results ◄───┘            │
//! │     └── MarkerOp stream ──► take_marker_ops()                     │
//! │                                                                   │
//! │  3. GeofenceSession ◄── begin_location_pick() / evaluate_pick()   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use proxima::app::{AppConfig, ProximityApp};
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?)?;
//! let app = ProximityApp::start(config, source, store).await?;
//!
//! // Hand markers to the renderer
//! let ops = app.take_marker_ops();
//!
//! // Graceful shutdown
//! app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::ProximityApp;
pub use config::{
    AppConfig, ANONYMOUS_USER, DEFAULT_CENTER, DEFAULT_GEOFENCE_RADIUS_M, DEFAULT_NEARBY_RADIUS_M,
    DEFAULT_REQUERY_DISTANCE_M,
};
pub use error::AppError;
