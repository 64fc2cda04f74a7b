//! Live position tracking.
//!
//! [`PositionTracker`] turns the platform's noisy, asynchronous callback stream
//! into one always-current [`Coordinate`] plus explicit error state, both
//! observable through `tokio::sync::watch` channels.
//!
//! # State Transitions
//!
//! ```text
//!            start()                 platform error
//!   Idle ───────────────► Watching ─────────────────► Errored(reason)
//!    ▲                     │  ▲                         │
//!    │       stop()        │  └──── fix / start() ──────┘
//!    └─────────────────────┘
//! ```
//!
//! Errors never erase the last good coordinate, and neither does `stop()`.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::Coordinate;

use super::source::{LocationSource, LocationStream, LocationUpdate};
use super::types::{LocationError, LocationOptions, TrackingState};

/// Observable state shared with the subscription pump task.
struct TrackerShared {
    state: watch::Sender<TrackingState>,
    coordinate: watch::Sender<Option<Coordinate>>,
    error: watch::Sender<Option<LocationError>>,
    /// Bumped on every start/stop; updates from older subscriptions are ignored.
    generation: Mutex<u64>,
}

impl TrackerShared {
    fn apply(&self, generation: u64, update: LocationUpdate) {
        let current = self.generation.lock();
        if *current != generation {
            return;
        }

        match update {
            Ok(fix) => {
                debug!(%fix, accuracy_m = fix.accuracy_meters, "Position update");
                self.coordinate.send_replace(Some(fix));
                self.error.send_replace(None);
                self.state.send_if_modified(|state| {
                    if matches!(state, TrackingState::Errored(_)) {
                        *state = TrackingState::Watching;
                        true
                    } else {
                        false
                    }
                });
            }
            Err(error) => {
                warn!(%error, "Location platform reported an error");
                self.error.send_replace(Some(error));
                self.state.send_replace(TrackingState::Errored(error));
            }
        }
    }

    fn stream_ended(&self, generation: u64) {
        let current = self.generation.lock();
        if *current == generation {
            warn!("Location stream ended without stop()");
            self.error.send_replace(Some(LocationError::Unavailable));
            self.state
                .send_replace(TrackingState::Errored(LocationError::Unavailable));
        }
    }
}

struct Subscription {
    cancel: CancellationToken,
}

/// Tracks the user's live position.
///
/// At most one platform subscription is active at a time. `start()` and
/// `stop()` are idempotent. `start()` spawns the subscription pump on the
/// current Tokio runtime.
pub struct PositionTracker {
    source: Arc<dyn LocationSource>,
    options: LocationOptions,
    shared: Arc<TrackerShared>,
    subscription: Mutex<Option<Subscription>>,
}

impl PositionTracker {
    /// Create an idle tracker over the given platform source.
    pub fn new(source: Arc<dyn LocationSource>, options: LocationOptions) -> Self {
        let (state, _) = watch::channel(TrackingState::Idle);
        let (coordinate, _) = watch::channel(None);
        let (error, _) = watch::channel(None);

        Self {
            source,
            options,
            shared: Arc::new(TrackerShared {
                state,
                coordinate,
                error,
                generation: Mutex::new(0),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Begin continuous tracking.
    ///
    /// No-op while already `Watching`. From `Errored`, the existing
    /// subscription is replaced with a fresh one.
    pub fn start(&self) {
        let mut subscription = self.subscription.lock();
        if self.state().is_watching() {
            return;
        }

        if let Some(previous) = subscription.take() {
            previous.cancel.cancel();
        }

        let generation = {
            let mut generation = self.shared.generation.lock();
            *generation += 1;
            *generation
        };

        match self.source.watch(&self.options) {
            Ok(stream) => {
                info!(
                    high_accuracy = self.options.high_accuracy,
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "Position tracking started"
                );
                self.shared.error.send_replace(None);
                self.shared.state.send_replace(TrackingState::Watching);

                let cancel = CancellationToken::new();
                tokio::spawn(pump(
                    stream,
                    Arc::clone(&self.shared),
                    generation,
                    cancel.clone(),
                ));
                *subscription = Some(Subscription { cancel });
            }
            Err(error) => {
                warn!(%error, "Could not start position tracking");
                self.shared.error.send_replace(Some(error));
                self.shared.state.send_replace(TrackingState::Errored(error));
            }
        }
    }

    /// Stop continuous tracking. The last coordinate stays available.
    pub fn stop(&self) {
        let mut subscription = self.subscription.lock();
        *self.shared.generation.lock() += 1;

        if let Some(previous) = subscription.take() {
            previous.cancel.cancel();
            info!("Position tracking stopped");
        }

        self.shared.state.send_if_modified(|state| {
            if *state == TrackingState::Idle {
                false
            } else {
                *state = TrackingState::Idle;
                true
            }
        });
    }

    /// Request one fresh fix without touching the tracking state.
    ///
    /// A successful fix also becomes the latest coordinate. Failures are
    /// returned to the caller only.
    pub async fn get_coordinate_once(&self) -> Result<Coordinate, LocationError> {
        let fix = self.source.current_position(&self.options).await?;
        self.shared.coordinate.send_replace(Some(fix));
        Ok(fix)
    }

    /// Current tracking state.
    pub fn state(&self) -> TrackingState {
        *self.shared.state.borrow()
    }

    /// Latest known coordinate, if any fix has ever been observed.
    pub fn coordinate(&self) -> Option<Coordinate> {
        *self.shared.coordinate.borrow()
    }

    /// Latest platform error, cleared by the next good fix or `start()`.
    pub fn last_error(&self) -> Option<LocationError> {
        *self.shared.error.borrow()
    }

    /// Subscribe to coordinate changes.
    pub fn subscribe_coordinates(&self) -> watch::Receiver<Option<Coordinate>> {
        self.shared.coordinate.subscribe()
    }

    /// Subscribe to tracking state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<TrackingState> {
        self.shared.state.subscribe()
    }

    /// Subscribe to error changes.
    pub fn subscribe_errors(&self) -> watch::Receiver<Option<LocationError>> {
        self.shared.error.subscribe()
    }

    /// Options passed to the platform.
    pub fn options(&self) -> &LocationOptions {
        &self.options
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.cancel.cancel();
        }
    }
}

async fn pump(
    mut stream: LocationStream,
    shared: Arc<TrackerShared>,
    generation: u64,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            update = stream.recv() => match update {
                Some(update) => shared.apply(generation, update),
                None => {
                    shared.stream_ended(generation);
                    break;
                }
            },
        }
    }
    debug!(generation, "Location subscription closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::location::ChannelLocationSource;

    const WAIT: Duration = Duration::from_secs(2);

    fn tracker() -> (PositionTracker, ChannelLocationSource, crate::location::LocationFeed) {
        let (source, feed) = ChannelLocationSource::new();
        let tracker = PositionTracker::new(Arc::new(source.clone()), LocationOptions::default());
        (tracker, source, feed)
    }

    async fn next_coordinate(rx: &mut watch::Receiver<Option<Coordinate>>) -> Option<Coordinate> {
        tokio::time::timeout(WAIT, rx.changed())
            .await
            .expect("timed out waiting for coordinate")
            .expect("tracker dropped");
        *rx.borrow_and_update()
    }

    async fn next_state(rx: &mut watch::Receiver<TrackingState>) -> TrackingState {
        tokio::time::timeout(WAIT, rx.changed())
            .await
            .expect("timed out waiting for state")
            .expect("tracker dropped");
        *rx.borrow_and_update()
    }

    #[tokio::test]
    async fn test_starts_idle_without_coordinate() {
        let (tracker, _source, _feed) = tracker();
        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(tracker.coordinate(), None);
        assert_eq!(tracker.last_error(), None);
    }

    #[tokio::test]
    async fn test_start_watches_and_publishes_fixes() {
        let (tracker, _source, feed) = tracker();
        let mut coords = tracker.subscribe_coordinates();

        tracker.start();
        assert_eq!(tracker.state(), TrackingState::Watching);

        let fix = Coordinate::new(19.40, -99.10).with_accuracy(12.0);
        feed.push_fix(fix);

        assert_eq!(next_coordinate(&mut coords).await, Some(fix));
        assert_eq!(tracker.coordinate(), Some(fix));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (tracker, source, _feed) = tracker();

        tracker.start();
        tracker.start();
        tracker.start();

        assert_eq!(source.watches_opened(), 1);
        assert!(source.has_active_watch());
    }

    #[tokio::test]
    async fn test_permission_denied_keeps_last_coordinate() {
        let (tracker, _source, feed) = tracker();
        let mut coords = tracker.subscribe_coordinates();
        let mut states = tracker.subscribe_state();

        tracker.start();
        assert_eq!(next_state(&mut states).await, TrackingState::Watching);

        let fix = Coordinate::new(19.40, -99.10);
        feed.push_fix(fix);
        next_coordinate(&mut coords).await;

        feed.push_error(LocationError::PermissionDenied);
        assert_eq!(
            next_state(&mut states).await,
            TrackingState::Errored(LocationError::PermissionDenied)
        );
        assert_eq!(tracker.last_error(), Some(LocationError::PermissionDenied));
        assert_eq!(tracker.coordinate(), Some(fix));
    }

    #[tokio::test]
    async fn test_fix_after_error_recovers() {
        let (tracker, _source, feed) = tracker();
        let mut states = tracker.subscribe_state();

        tracker.start();
        next_state(&mut states).await;

        feed.push_error(LocationError::Timeout);
        assert_eq!(
            next_state(&mut states).await,
            TrackingState::Errored(LocationError::Timeout)
        );

        feed.push_fix(Coordinate::new(1.0, 1.0));
        assert_eq!(next_state(&mut states).await, TrackingState::Watching);
        assert_eq!(tracker.last_error(), None);
    }

    #[tokio::test]
    async fn test_start_from_errored_replaces_subscription() {
        let (tracker, source, feed) = tracker();
        let mut states = tracker.subscribe_state();

        tracker.start();
        next_state(&mut states).await;
        feed.push_error(LocationError::Unavailable);
        next_state(&mut states).await;

        tracker.start();
        assert_eq!(tracker.state(), TrackingState::Watching);
        assert_eq!(tracker.last_error(), None);
        assert_eq!(source.watches_opened(), 2);
    }

    #[tokio::test]
    async fn test_stop_keeps_coordinate_and_ignores_late_updates() {
        let (tracker, source, feed) = tracker();
        let mut coords = tracker.subscribe_coordinates();

        tracker.start();
        let fix = Coordinate::new(19.40, -99.10);
        feed.push_fix(fix);
        next_coordinate(&mut coords).await;

        tracker.stop();
        tracker.stop();
        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(tracker.coordinate(), Some(fix));

        // Pump exits and drops the stream once cancelled
        tokio::time::timeout(WAIT, async {
            while source.has_active_watch() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription should close after stop");

        feed.push_fix(Coordinate::new(0.0, 0.0));
        tokio::task::yield_now().await;
        assert_eq!(tracker.coordinate(), Some(fix));
    }

    #[tokio::test]
    async fn test_stream_end_is_unavailable() {
        let (tracker, _source, feed) = tracker();
        let mut states = tracker.subscribe_state();

        tracker.start();
        next_state(&mut states).await;

        feed.close_watch();
        assert_eq!(
            next_state(&mut states).await,
            TrackingState::Errored(LocationError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_one_shot_does_not_change_state() {
        let (tracker, _source, feed) = tracker();

        let request = tracker.get_coordinate_once();
        let pusher = async {
            tokio::task::yield_now().await;
            feed.push_fix(Coordinate::new(19.40, -99.10));
        };
        let (result, _) = tokio::join!(request, pusher);

        assert_eq!(result, Ok(Coordinate::new(19.40, -99.10)));
        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(tracker.coordinate(), Some(Coordinate::new(19.40, -99.10)));
    }

    #[tokio::test]
    async fn test_one_shot_failure_leaves_tracker_untouched() {
        let (tracker, _source, feed) = tracker();

        let request = tracker.get_coordinate_once();
        let pusher = async {
            tokio::task::yield_now().await;
            feed.push_error(LocationError::PermissionDenied);
        };
        let (result, _) = tokio::join!(request, pusher);

        assert_eq!(result, Err(LocationError::PermissionDenied));
        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(tracker.last_error(), None);
    }
}
