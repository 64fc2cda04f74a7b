//! Nearby business queries
//!
//! [`NearbyQueryCoordinator`] sends spatial queries to the remote store on
//! every meaningful position change or explicit recenter and republishes only
//! the response to the most recently issued query ("last request wins").
//!
//! # Example
//!
//! ```ignore
//! let coordinator = Arc::new(NearbyQueryCoordinator::new(store));
//! let mut results = coordinator.subscribe_results();
//!
//! coordinator.query(center, 1_000.0).await?;
//! let latest = results.borrow().clone();
//! ```

mod coordinator;

pub use coordinator::{
    FollowPolicy, NearbyQuery, NearbyQueryCoordinator, NearbyResults, QueryFailed, QueryOutcome,
};
