//! Proximity gate for map picks
//!
//! A [`GeofenceSession`] is armed with a snapshot of the user's live position
//! and then accepts or rejects picked points by their haversine distance to
//! that snapshot. The center never follows the live position after arming,
//! so GPS jitter cannot flip a decision mid-interaction.
//!
//! ```text
//!   Inactive ──arm()──► Armed ──evaluate()──► Accepted / Rejected
//!      ▲                              ▲              │
//!      │                              └─evaluate()───┘
//!      └──────────────── disarm() (from any state)
//! ```

mod session;

pub use session::{
    GeofenceError, GeofenceOutcome, GeofenceRejected, GeofenceSession, GeofenceState,
};
