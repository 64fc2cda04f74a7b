//! Map markers
//!
//! The marker layer is a pure function of two observables: the tracker's
//! live position and the coordinator's latest nearby results.
//! [`MarkerSyncController`] owns the set of drawn markers and turns each
//! change into the smallest list of [`MarkerOp`]s a renderer has to apply.
//!
//! ```text
//!   position ──┐
//!              ├──► MarkerSyncController ──► [Remove.., Upsert..] ──► renderer
//!   results ───┘          (MarkerSet)
//! ```
//!
//! The user marker uses the reserved key `"self"` and is never removed.

mod controller;
mod model;

pub use controller::MarkerSyncController;
pub use model::{MarkerAction, MarkerDescriptor, MarkerKey, MarkerOp, MarkerSet, MarkerVariant};
