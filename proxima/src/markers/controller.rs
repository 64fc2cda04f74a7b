//! Marker reconciliation.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::coord::Coordinate;
use crate::nearby::NearbyResults;
use crate::store::Business;

use super::model::{MarkerAction, MarkerDescriptor, MarkerKey, MarkerOp, MarkerSet};

/// Keeps the [`MarkerSet`] in step with the live position and the latest
/// nearby results, emitting only the operations needed to get there.
///
/// The controller is the only writer of its marker set; diffs are always
/// computed against it, never against the renderer's own state.
#[derive(Debug, Default)]
pub struct MarkerSyncController {
    markers: MarkerSet,
}

impl MarkerSyncController {
    pub fn new() -> Self {
        Self::default()
    }

    /// What is currently drawn.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Action attached to a marker, for the renderer to dispatch on click.
    pub fn action_for(&self, key: &MarkerKey) -> Option<&MarkerAction> {
        self.markers.get(key).and_then(|d| d.action.as_ref())
    }

    /// Move the user marker. Returns `None` when it is already there.
    ///
    /// The user marker is never removed once placed.
    pub fn sync_position(&mut self, coordinate: &Coordinate) -> Option<MarkerOp> {
        let descriptor = MarkerDescriptor::for_self(coordinate);
        self.upsert(MarkerKey::SelfPosition, descriptor)
    }

    /// Reconcile business markers with a new result set.
    ///
    /// Removals come first (in key order), then upserts in result order for
    /// businesses that are new or whose marker changed. Unchanged businesses
    /// produce nothing.
    pub fn sync_results(&mut self, businesses: &[Business]) -> Vec<MarkerOp> {
        let mut incoming: Vec<(MarkerKey, MarkerDescriptor)> = Vec::with_capacity(businesses.len());
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(businesses.len());
        for business in businesses {
            let descriptor = MarkerDescriptor::for_business(business);
            match index.get(business.id.as_str()) {
                // Duplicate id in one result set: later row wins
                Some(&i) => incoming[i].1 = descriptor,
                None => {
                    index.insert(business.id.as_str(), incoming.len());
                    incoming.push((MarkerKey::business(business.id.clone()), descriptor));
                }
            }
        }

        let stale: Vec<MarkerKey> = self
            .markers
            .keys()
            .filter(|key| match key {
                MarkerKey::SelfPosition => false,
                MarkerKey::Business(id) => !index.contains_key(id.as_str()),
            })
            .cloned()
            .collect();

        let mut ops = Vec::new();
        for key in stale {
            self.markers.remove(&key);
            ops.push(MarkerOp::Remove { key });
        }
        for (key, descriptor) in incoming {
            if let Some(op) = self.upsert(key, descriptor) {
                ops.push(op);
            }
        }
        ops
    }

    fn upsert(&mut self, key: MarkerKey, descriptor: MarkerDescriptor) -> Option<MarkerOp> {
        if self.markers.get(&key) == Some(&descriptor) {
            return None;
        }
        self.markers.insert(key.clone(), descriptor.clone());
        Some(MarkerOp::Upsert { key, descriptor })
    }

    /// Run the controller against live observables.
    ///
    /// Operations are delivered on the returned channel in the order they
    /// are produced. The task ends on cancellation, when both inputs close,
    /// or when the receiver is dropped, and yields the final marker set.
    pub fn run(
        mut self,
        mut positions: watch::Receiver<Option<Coordinate>>,
        mut results: watch::Receiver<Option<Arc<NearbyResults>>>,
        cancel: CancellationToken,
    ) -> (mpsc::UnboundedReceiver<MarkerOp>, JoinHandle<MarkerSet>) {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut positions_open = true;
            let mut results_open = true;

            let initial_position = *positions.borrow_and_update();
            let initial_results = results.borrow_and_update().clone();
            self.emit_position(initial_position, &ops_tx);
            self.emit_results(initial_results, &ops_tx);

            while (positions_open || results_open) && !ops_tx.is_closed() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = positions.changed(), if positions_open => {
                        if changed.is_err() {
                            positions_open = false;
                            continue;
                        }
                        let position = *positions.borrow_and_update();
                        self.emit_position(position, &ops_tx);
                    }
                    changed = results.changed(), if results_open => {
                        if changed.is_err() {
                            results_open = false;
                            continue;
                        }
                        let latest = results.borrow_and_update().clone();
                        self.emit_results(latest, &ops_tx);
                    }
                }
            }

            debug!(markers = self.markers.len(), "Marker sync stopped");
            self.markers
        });

        (ops_rx, handle)
    }

    fn emit_position(&mut self, position: Option<Coordinate>, ops: &mpsc::UnboundedSender<MarkerOp>) {
        if let Some(op) = position.and_then(|p| self.sync_position(&p)) {
            let _ = ops.send(op);
        }
    }

    fn emit_results(
        &mut self,
        results: Option<Arc<NearbyResults>>,
        ops: &mpsc::UnboundedSender<MarkerOp>,
    ) {
        let Some(results) = results else {
            return;
        };
        let changes = self.sync_results(&results.businesses);
        debug!(
            request_id = results.query.request_id,
            ops = changes.len(),
            "Reconciled business markers"
        );
        for op in changes {
            let _ = ops.send(op);
        }
    }
}
