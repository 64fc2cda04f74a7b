//! Application bootstrap implementation.
//!
//! `ProximityApp` starts the position tracker, the nearby follower, and the
//! marker sync loop in the right order, and tears them down together.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::coord::Coordinate;
use crate::geofence::{GeofenceOutcome, GeofenceSession, GeofenceState};
use crate::location::{LocationSource, PositionTracker};
use crate::markers::{MarkerOp, MarkerSet, MarkerSyncController};
use crate::nearby::{NearbyQueryCoordinator, QueryOutcome};
use crate::store::RemoteStore;
use crate::submission::{self, BusinessDraft, RatingDraft};

/// Proximity session with proper task lifecycle management.
///
/// Startup order:
/// 1. Position tracker (continuous subscription)
/// 2. Initial nearby query at the default center when no fix is known yet
/// 3. Nearby follower (re-queries as the user moves)
/// 4. Marker sync loop (position + results → marker ops)
///
/// # Example
///
/// ```ignore
/// use proxima::app::{AppConfig, ProximityApp};
///
/// let app = ProximityApp::start(AppConfig::default(), source, store).await?;
/// let mut ops = app.take_marker_ops().unwrap();
///
/// // User taps "register here"
/// let center = app.begin_location_pick()?;
/// match app.evaluate_pick(picked)? {
///     GeofenceOutcome::Accepted(_) => app.register_business(draft).await?,
///     GeofenceOutcome::Rejected(r) => println!("{}", r),
/// };
///
/// app.shutdown().await;
/// ```
pub struct ProximityApp {
    config: AppConfig,
    tracker: PositionTracker,
    coordinator: Arc<NearbyQueryCoordinator>,
    store: Arc<dyn RemoteStore>,
    geofence: Mutex<GeofenceSession>,
    marker_ops: Mutex<Option<mpsc::UnboundedReceiver<MarkerOp>>>,
    cancel: CancellationToken,
    follower: JoinHandle<()>,
    marker_task: JoinHandle<MarkerSet>,
}

impl ProximityApp {
    /// Start the application.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the configuration is invalid. Tracking
    /// failures are not errors here; they surface through the tracker state.
    pub async fn start(
        config: AppConfig,
        source: Arc<dyn LocationSource>,
        store: Arc<dyn RemoteStore>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        info!(
            geofence_radius_m = config.geofence_radius_meters,
            nearby_radius_m = config.nearby.radius_meters,
            requery_distance_m = config.nearby.requery_distance_meters,
            "Starting proximity session"
        );

        // 1. Tracker
        let tracker = PositionTracker::new(source, config.location);
        tracker.start();

        // 2. Initial query. Issued before the follower so any live-position
        //    query the follower makes gets a newer request id.
        let coordinator = Arc::new(NearbyQueryCoordinator::new(Arc::clone(&store)));
        if tracker.coordinate().is_none() {
            let initial = coordinator.query(config.default_center, config.nearby.radius_meters);
            debug!(center = %config.default_center, "Initial nearby query at default center");
            tokio::spawn(async move {
                let _ = initial.await;
            });
        }

        // 3. Follower
        let cancel = CancellationToken::new();
        let follower =
            coordinator.follow(tracker.subscribe_coordinates(), config.nearby, cancel.child_token());

        // 4. Markers
        let (ops, marker_task) = MarkerSyncController::new().run(
            tracker.subscribe_coordinates(),
            coordinator.subscribe_results(),
            cancel.child_token(),
        );

        info!("Proximity session started");

        Ok(Self {
            config,
            tracker,
            coordinator,
            store,
            geofence: Mutex::new(GeofenceSession::new()),
            marker_ops: Mutex::new(Some(ops)),
            cancel,
            follower,
            marker_task,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn coordinator(&self) -> &Arc<NearbyQueryCoordinator> {
        &self.coordinator
    }

    /// Hand the marker operation stream to the renderer. Returns `None` after
    /// the first call.
    pub fn take_marker_ops(&self) -> Option<mpsc::UnboundedReceiver<MarkerOp>> {
        self.marker_ops.lock().take()
    }

    /// Query around an explicit map center (user pan).
    pub async fn recenter(&self, center: Coordinate) -> Result<QueryOutcome, AppError> {
        debug!(%center, "Recenter requested");
        Ok(self
            .coordinator
            .query(center, self.config.nearby.radius_meters)
            .await?)
    }

    /// Arm a geofence at the live position for a registration pick.
    ///
    /// Any previous pick session is discarded. Returns the frozen center.
    pub fn begin_location_pick(&self) -> Result<Coordinate, AppError> {
        let center = self.tracker.coordinate().ok_or(AppError::NoPosition)?;
        let mut session = self.geofence.lock();
        session.disarm();
        session.arm(center, self.config.geofence_radius_meters)?;
        Ok(center)
    }

    /// Evaluate a point picked on the map.
    pub fn evaluate_pick(&self, point: Coordinate) -> Result<GeofenceOutcome, AppError> {
        Ok(self.geofence.lock().evaluate(point)?)
    }

    /// Abandon the current pick session.
    pub fn cancel_location_pick(&self) {
        self.geofence.lock().disarm();
    }

    /// Current pick session state.
    pub fn geofence_state(&self) -> GeofenceState {
        *self.geofence.lock().state()
    }

    /// Register a business at the accepted pick.
    ///
    /// On success the pick session is closed and the nearby set refreshed
    /// around the live position (or the new business when no fix is known).
    /// A pick session started while the store call was pending is left alone.
    pub async fn register_business(&self, draft: BusinessDraft) -> Result<String, AppError> {
        let session = self.geofence.lock().clone();
        let id = submission::register_business(self.store.as_ref(), draft, &session).await?;

        {
            let mut current = self.geofence.lock();
            if current.state() == session.state() {
                current.disarm();
            } else {
                debug!(
                    state = ?current.state(),
                    "Pick session changed during registration; keeping it"
                );
            }
        }
        let refresh_center = self
            .tracker
            .coordinate()
            .or_else(|| session.accepted_point())
            .unwrap_or(self.config.default_center);
        if let Err(e) = self.recenter(refresh_center).await {
            warn!(error = %e, "Refresh after registration failed");
        }
        Ok(id)
    }

    /// A rating draft for `business_id` under the configured identity.
    pub fn rating_draft(&self, business_id: impl Into<String>, is_honest: bool) -> RatingDraft {
        RatingDraft::new(business_id, self.config.rating_user_id.clone(), is_honest)
    }

    /// Submit a rating.
    pub async fn submit_rating(&self, draft: RatingDraft) -> Result<String, AppError> {
        Ok(submission::submit_rating(self.store.as_ref(), draft).await?)
    }

    /// Shut down all tasks and stop the tracker.
    ///
    /// Returns the marker set as last reconciled.
    pub async fn shutdown(self) -> MarkerSet {
        info!("Shutting down proximity session");

        self.cancel.cancel();
        self.tracker.stop();

        let (follower, markers) = futures::join!(self.follower, self.marker_task);
        if let Err(e) = follower {
            warn!(error = %e, "Nearby follower ended abnormally");
        }
        let markers = markers.unwrap_or_else(|e| {
            warn!(error = %e, "Marker sync ended abnormally");
            MarkerSet::new()
        });

        info!(markers = markers.len(), "Proximity session shut down");
        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::coord::offset_north;
    use crate::location::{ChannelLocationSource, LocationFeed, TrackingState};
    use crate::markers::MarkerKey;
    use tokio::sync::Notify;

    use crate::store::{Business, InMemoryStore, NewBusiness, NewRating, StoreError};
    use crate::submission::SubmissionError;
    use crate::BoxFuture;

    /// In-memory store whose `create_business` waits for `release`.
    struct HeldCreateStore {
        inner: InMemoryStore,
        entered: Notify,
        release: Notify,
    }

    impl RemoteStore for HeldCreateStore {
        fn nearby_businesses(
            &self,
            latitude: f64,
            longitude: f64,
            radius_meters: f64,
        ) -> BoxFuture<'_, Result<Vec<Business>, StoreError>> {
            self.inner.nearby_businesses(latitude, longitude, radius_meters)
        }

        fn create_business(
            &self,
            business: NewBusiness,
        ) -> BoxFuture<'_, Result<String, StoreError>> {
            Box::pin(async move {
                self.entered.notify_one();
                self.release.notified().await;
                self.inner.create_business(business).await
            })
        }

        fn add_rating(&self, rating: NewRating) -> BoxFuture<'_, Result<String, StoreError>> {
            self.inner.add_rating(rating)
        }
    }

    fn business(id: &str, coordinate: Coordinate) -> Business {
        Business {
            id: id.to_string(),
            name: format!("Negocio {}", id),
            category: "Food".to_string(),
            is_informal: true,
            coordinate,
            description: None,
        }
    }

    async fn start_app(store: Arc<InMemoryStore>) -> (ProximityApp, LocationFeed) {
        let (source, feed) = ChannelLocationSource::new();
        let app = ProximityApp::start(AppConfig::default(), Arc::new(source), store)
            .await
            .unwrap();
        (app, feed)
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_start_queries_default_center() {
        let store = Arc::new(InMemoryStore::with_businesses([business(
            "zocalo",
            AppConfig::default().default_center,
        )]));
        let (app, _feed) = start_app(store).await;

        assert_eq!(app.tracker().state(), TrackingState::Watching);
        wait_for(|| app.coordinator().results().is_some()).await;

        let results = app.coordinator().results().unwrap();
        assert_eq!(results.query.center, app.config().default_center);
        assert_eq!(results.businesses[0].id, "zocalo");

        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_pick_requires_position() {
        let (app, _feed) = start_app(Arc::new(InMemoryStore::new())).await;
        assert_eq!(app.begin_location_pick(), Err(AppError::NoPosition));
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_register_flow() {
        let store = Arc::new(InMemoryStore::new());
        let (app, feed) = start_app(Arc::clone(&store)).await;

        let here = Coordinate::new(19.40, -99.10);
        feed.push_fix(here);
        wait_for(|| app.tracker().coordinate().is_some()).await;

        assert_eq!(app.begin_location_pick().unwrap(), here);

        let far = offset_north(&here, 45.0);
        let GeofenceOutcome::Rejected(rejected) = app.evaluate_pick(far).unwrap() else {
            panic!("45m pick should be rejected");
        };
        assert!((rejected.overage_meters() - 15.0).abs() < 0.5);

        let draft = BusinessDraft::new("Tacos Don Pepe", "Food");
        assert_eq!(
            app.register_business(draft.clone()).await,
            Err(AppError::Submission(SubmissionError::LocationNotAccepted))
        );

        let near = offset_north(&here, 10.0);
        assert!(app.evaluate_pick(near).unwrap().is_accepted());
        let id = app.register_business(draft).await.unwrap();

        assert_eq!(app.geofence_state(), GeofenceState::Inactive);
        let results = app.coordinator().results().unwrap();
        assert!(results.businesses.iter().any(|b| b.id == id));

        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_marker_ops_and_shutdown() {
        let here = Coordinate::new(19.40, -99.10);
        let store = Arc::new(InMemoryStore::with_businesses([business(
            "b1",
            offset_north(&here, 100.0),
        )]));
        let (app, feed) = start_app(store).await;
        let mut ops = app.take_marker_ops().unwrap();
        assert!(app.take_marker_ops().is_none());

        feed.push_fix(here);

        let mut seen = Vec::new();
        while !seen.contains(&MarkerKey::business("b1")) {
            let op = tokio::time::timeout(Duration::from_secs(2), ops.recv())
                .await
                .expect("timed out waiting for marker op")
                .expect("marker stream closed");
            seen.push(op.key().clone());
        }
        assert!(seen.contains(&MarkerKey::SelfPosition));

        let markers = app.shutdown().await;
        assert!(markers.contains_key(&MarkerKey::SelfPosition));
        assert!(markers.contains_key(&MarkerKey::business("b1")));
    }

    #[tokio::test]
    async fn test_rating_uses_configured_user() {
        let store = Arc::new(InMemoryStore::with_businesses([business(
            "b1",
            Coordinate::new(0.0, 0.0),
        )]));
        let (app, _feed) = start_app(Arc::clone(&store)).await;

        let draft = app.rating_draft("b1", true).with_comment("Buen precio");
        app.submit_rating(draft).await.unwrap();

        let ratings = store.ratings();
        assert_eq!(ratings[0].1.user_id, "anonymous");
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_register_keeps_pick_started_while_pending() {
        let store = Arc::new(HeldCreateStore {
            inner: InMemoryStore::new(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let (source, feed) = ChannelLocationSource::new();
        let app = ProximityApp::start(AppConfig::default(), Arc::new(source), store.clone())
            .await
            .unwrap();

        let here = Coordinate::new(19.40, -99.10);
        feed.push_fix(here);
        wait_for(|| app.tracker().coordinate().is_some()).await;

        app.begin_location_pick().unwrap();
        assert!(app.evaluate_pick(offset_north(&here, 10.0)).unwrap().is_accepted());

        let second_pick = offset_north(&here, 8.0);
        let (registered, state_before_release) = futures::join!(
            app.register_business(BusinessDraft::new("Tacos Don Pepe", "Food")),
            async {
                store.entered.notified().await;
                app.begin_location_pick().unwrap();
                assert!(app.evaluate_pick(second_pick).unwrap().is_accepted());
                let state = app.geofence_state();
                store.release.notify_one();
                state
            }
        );

        registered.unwrap();
        assert!(matches!(state_before_release, GeofenceState::Accepted { .. }));
        assert_eq!(app.geofence_state(), state_before_release);

        app.shutdown().await;
    }
}
