//! Proxima - proximity-gated business registration and nearby browsing
//!
//! This library provides the in-process core used by a map UI shell to let a
//! user register a small business only while standing near it, and to browse
//! and rate businesses around their live position.
//!
//! # Architecture
//!
//! ```text
//! LocationSource ──► PositionTracker ──┬──► GeofenceSession (pick validation)
//!   (platform)        (live fix)       │
//!                                      ├──► NearbyQueryCoordinator ──► RemoteStore
//!                                      │         (last request wins)
//!                                      ▼              │
//!                             MarkerSyncController ◄──┘
//!                                      │
//!                                      ▼
//!                               MarkerOp stream ──► renderer
//! ```
//!
//! [`app::ProximityApp`] wires these together; each component is usable on
//! its own as well.

use std::future::Future;
use std::pin::Pin;

pub mod app;
pub mod config;
pub mod coord;
pub mod geofence;
pub mod location;
pub mod logging;
pub mod markers;
pub mod nearby;
pub mod store;
pub mod submission;

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
