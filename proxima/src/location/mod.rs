//! Live location tracking
//!
//! This module wraps the platform's location primitive into a single,
//! continuously-updated coordinate with explicit error state.
//!
//! # Example
//!
//! ```ignore
//! use proxima::location::{ChannelLocationSource, LocationOptions, PositionTracker};
//!
//! let (source, feed) = ChannelLocationSource::new();
//! let tracker = PositionTracker::new(Arc::new(source), LocationOptions::default());
//! tracker.start();
//!
//! // Host forwards platform callbacks
//! feed.push_fix(Coordinate::new(19.40, -99.10).with_accuracy(8.0));
//!
//! let mut coords = tracker.subscribe_coordinates();
//! coords.changed().await?;
//! ```

mod source;
mod tracker;
mod types;

pub use source::{
    ChannelLocationSource, LocationFeed, LocationSource, LocationStream, LocationUpdate,
};
pub use tracker::PositionTracker;
pub use types::{
    LocationError, LocationOptions, TrackingState, DEFAULT_MAX_CACHE_AGE, DEFAULT_TIMEOUT,
};
