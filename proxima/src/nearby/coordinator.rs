//! Nearby query coordinator.
//!
//! Every query takes a fresh id from a monotonic counter. When a response
//! arrives it is applied only if its id is still the latest issued; anything
//! older is dropped silently, success or failure. In-flight calls are never
//! cancelled, just ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::coord::{distance_meters, Coordinate};
use crate::store::{Business, RemoteStore, StoreError};
use crate::BoxFuture;

/// A query as issued to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub center: Coordinate,
    pub radius_meters: f64,
    pub request_id: u64,
}

/// The published, render-ready result set.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyResults {
    pub query: NearbyQuery,
    /// Businesses in store order (nearest first).
    pub businesses: Vec<Business>,
}

/// A failure of the latest issued query.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("nearby query {request_id} failed: {cause}")]
pub struct QueryFailed {
    pub request_id: u64,
    #[source]
    pub cause: StoreError,
}

/// What happened to a completed query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The response was current and is now the published result set.
    Applied(Arc<NearbyResults>),
    /// A newer query was issued before this one completed; the response
    /// (or failure) was discarded.
    Stale { request_id: u64 },
}

/// When the follower re-queries as the user moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowPolicy {
    /// Search radius for each query.
    pub radius_meters: f64,
    /// Minimum movement from the last query center before re-querying.
    pub requery_distance_meters: f64,
}

/// Issues nearby-business queries and republishes the latest result set.
pub struct NearbyQueryCoordinator {
    store: Arc<dyn RemoteStore>,
    latest_issued: AtomicU64,
    results: watch::Sender<Option<Arc<NearbyResults>>>,
    failure: watch::Sender<Option<QueryFailed>>,
}

impl NearbyQueryCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        let (results, _) = watch::channel(None);
        let (failure, _) = watch::channel(None);
        Self {
            store,
            latest_issued: AtomicU64::new(0),
            results,
            failure,
        }
    }

    /// Issue a query around `center`.
    ///
    /// The request id is taken immediately; the store call runs when the
    /// returned future is first polled. Resolves to the outcome, or to
    /// [`QueryFailed`] if the store call failed while this query was still
    /// the latest.
    pub fn query(
        self: &Arc<Self>,
        center: Coordinate,
        radius_meters: f64,
    ) -> BoxFuture<'static, Result<QueryOutcome, QueryFailed>> {
        let request_id = self.latest_issued.fetch_add(1, Ordering::SeqCst) + 1;
        let query = NearbyQuery {
            center,
            radius_meters,
            request_id,
        };
        let this = Arc::clone(self);
        Box::pin(async move { this.execute(query).await })
    }

    async fn execute(&self, query: NearbyQuery) -> Result<QueryOutcome, QueryFailed> {
        let request_id = query.request_id;
        debug!(request_id, center = %query.center, radius_m = query.radius_meters, "Issuing nearby query");

        let response = self
            .store
            .nearby_businesses(
                query.center.latitude,
                query.center.longitude,
                query.radius_meters,
            )
            .await;

        match response {
            Ok(businesses) => {
                let count = businesses.len();
                let results = Arc::new(NearbyResults { query, businesses });
                let applied = self.results.send_if_modified(|current| {
                    let newer_published = current
                        .as_ref()
                        .is_some_and(|c| c.query.request_id >= request_id);
                    if !self.is_latest(request_id) || newer_published {
                        return false;
                    }
                    *current = Some(Arc::clone(&results));
                    true
                });

                if applied {
                    self.failure.send_if_modified(|f| f.take().is_some());
                    debug!(request_id, count, "Nearby results published");
                    Ok(QueryOutcome::Applied(results))
                } else {
                    debug!(request_id, "Discarding stale nearby response");
                    Ok(QueryOutcome::Stale { request_id })
                }
            }
            Err(cause) => {
                if !self.is_latest(request_id) {
                    debug!(request_id, %cause, "Discarding stale nearby failure");
                    return Ok(QueryOutcome::Stale { request_id });
                }
                warn!(request_id, %cause, "Nearby query failed");
                let failed = QueryFailed { request_id, cause };
                self.failure.send_replace(Some(failed.clone()));
                Err(failed)
            }
        }
    }

    fn is_latest(&self, request_id: u64) -> bool {
        self.latest_issued.load(Ordering::SeqCst) == request_id
    }

    /// Re-query whenever the observed position moves far enough.
    ///
    /// Each query runs as its own task so responses may complete out of
    /// order; stale ones are dropped by the request-id check.
    pub fn follow(
        self: &Arc<Self>,
        mut positions: watch::Receiver<Option<Coordinate>>,
        policy: FollowPolicy,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut last_center: Option<Coordinate> = None;
            loop {
                let position = *positions.borrow_and_update();
                if let Some(position) = position {
                    let moved_enough = last_center.map_or(true, |last| {
                        distance_meters(&last, &position) >= policy.requery_distance_meters
                    });
                    if moved_enough {
                        last_center = Some(position);
                        let query = this.query(position, policy.radius_meters);
                        tokio::spawn(async move {
                            // Outcome is already logged and published
                            let _ = query.await;
                        });
                    }
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = positions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Nearby follower stopped");
        })
    }

    /// Latest published result set.
    pub fn results(&self) -> Option<Arc<NearbyResults>> {
        self.results.borrow().clone()
    }

    /// Failure of the latest query, cleared by the next applied result.
    pub fn last_failure(&self) -> Option<QueryFailed> {
        self.failure.borrow().clone()
    }

    /// Id of the most recently issued query (0 before any).
    pub fn latest_request_id(&self) -> u64 {
        self.latest_issued.load(Ordering::SeqCst)
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Option<Arc<NearbyResults>>> {
        self.results.subscribe()
    }

    pub fn subscribe_failures(&self) -> watch::Receiver<Option<QueryFailed>> {
        self.failure.subscribe()
    }
}
