//! Platform location abstraction.
//!
//! The [`LocationSource`] trait is the seam between the library and the
//! device's location primitive. A UI shell either implements it directly or
//! uses [`ChannelLocationSource`] and forwards the platform callbacks through
//! a [`LocationFeed`].

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::coord::Coordinate;
use crate::BoxFuture;

use super::types::{LocationError, LocationOptions};

/// A single platform callback: a fix or an error.
pub type LocationUpdate = Result<Coordinate, LocationError>;

/// Continuous stream of platform callbacks. Dropping it ends the subscription.
pub type LocationStream = mpsc::UnboundedReceiver<LocationUpdate>;

/// Trait for the platform's location primitive.
///
/// This abstraction allows the tracker to be driven by a real device bridge
/// in production and by a scripted feed in tests.
pub trait LocationSource: Send + Sync {
    /// Subscribe to continuous location updates.
    ///
    /// Fails synchronously when the platform cannot start a subscription at
    /// all (e.g. no location support).
    fn watch(&self, options: &LocationOptions) -> Result<LocationStream, LocationError>;

    /// Request a single fix, independent of any continuous subscription.
    fn current_position(&self, options: &LocationOptions) -> BoxFuture<'_, LocationUpdate>;
}

#[derive(Default)]
struct FeedShared {
    watcher: Mutex<Option<mpsc::UnboundedSender<LocationUpdate>>>,
    pending: Mutex<Vec<oneshot::Sender<LocationUpdate>>>,
    last_fix: Mutex<Option<(Coordinate, Instant)>>,
    watches_opened: Mutex<usize>,
}

/// Location source fed by the host through a [`LocationFeed`].
///
/// Holds at most one live watcher; a new `watch` replaces the previous one.
/// One-shot requests resolve with the next pushed fix or error, or from the
/// last fix when the requested `max_cache_age` allows it.
#[derive(Clone)]
pub struct ChannelLocationSource {
    shared: Arc<FeedShared>,
}

/// Host-side handle used to push platform callbacks into a
/// [`ChannelLocationSource`].
#[derive(Clone)]
pub struct LocationFeed {
    shared: Arc<FeedShared>,
}

impl ChannelLocationSource {
    /// Create a source and the feed that drives it.
    pub fn new() -> (Self, LocationFeed) {
        let shared = Arc::new(FeedShared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            LocationFeed { shared },
        )
    }

    /// True when a watcher is subscribed and still listening.
    pub fn has_active_watch(&self) -> bool {
        self.shared
            .watcher
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Total number of `watch` calls served so far.
    pub fn watches_opened(&self) -> usize {
        *self.shared.watches_opened.lock()
    }

    /// One-shot requests still waiting for a fix.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.lock().len()
    }
}

impl LocationSource for ChannelLocationSource {
    fn watch(&self, _options: &LocationOptions) -> Result<LocationStream, LocationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Replacing the sender ends any previous stream
        *self.shared.watcher.lock() = Some(tx);
        *self.shared.watches_opened.lock() += 1;
        Ok(rx)
    }

    fn current_position(&self, options: &LocationOptions) -> BoxFuture<'_, LocationUpdate> {
        let options = *options;
        Box::pin(async move {
            if !options.max_cache_age.is_zero() {
                let cached = *self.shared.last_fix.lock();
                if let Some((fix, at)) = cached {
                    if at.elapsed() <= options.max_cache_age {
                        debug!(%fix, "Serving one-shot request from cached fix");
                        return Ok(fix);
                    }
                }
            }

            let (tx, rx) = oneshot::channel();
            {
                let mut pending = self.shared.pending.lock();
                // Requests that timed out or were dropped
                pending.retain(|tx| !tx.is_closed());
                pending.push(tx);
            }

            let answer = tokio::time::timeout(options.timeout, rx).await;
            match answer {
                Ok(Ok(update)) => update,
                // Feed dropped without answering
                Ok(Err(_)) => Err(LocationError::Unavailable),
                Err(_) => {
                    self.shared.pending.lock().retain(|tx| !tx.is_closed());
                    Err(LocationError::Timeout)
                }
            }
        })
    }
}

impl LocationFeed {
    /// Forward a successful platform fix.
    pub fn push_fix(&self, fix: Coordinate) {
        *self.shared.last_fix.lock() = Some((fix, Instant::now()));
        self.dispatch(Ok(fix));
    }

    /// Forward a platform error.
    pub fn push_error(&self, error: LocationError) {
        self.dispatch(Err(error));
    }

    /// End the current watch stream, as if the platform dropped it.
    pub fn close_watch(&self) {
        self.shared.watcher.lock().take();
    }

    fn dispatch(&self, update: LocationUpdate) {
        {
            let mut watcher = self.shared.watcher.lock();
            if let Some(tx) = watcher.as_ref() {
                if tx.send(update).is_err() {
                    watcher.take();
                }
            }
        }

        for waiter in self.shared.pending.lock().drain(..) {
            // Receiver may have timed out already
            let _ = waiter.send(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fix(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).with_accuracy(8.0)
    }

    #[tokio::test]
    async fn test_watch_receives_pushed_updates() {
        let (source, feed) = ChannelLocationSource::new();
        let mut stream = source.watch(&LocationOptions::default()).unwrap();

        feed.push_fix(fix(19.4, -99.1));
        feed.push_error(LocationError::Timeout);

        assert_eq!(stream.recv().await, Some(Ok(fix(19.4, -99.1))));
        assert_eq!(stream.recv().await, Some(Err(LocationError::Timeout)));
    }

    #[tokio::test]
    async fn test_new_watch_replaces_previous() {
        let (source, feed) = ChannelLocationSource::new();
        let mut first = source.watch(&LocationOptions::default()).unwrap();
        let mut second = source.watch(&LocationOptions::default()).unwrap();

        feed.push_fix(fix(1.0, 1.0));

        assert_eq!(first.recv().await, None, "First stream should be closed");
        assert_eq!(second.recv().await, Some(Ok(fix(1.0, 1.0))));
        assert_eq!(source.watches_opened(), 2);
    }

    #[tokio::test]
    async fn test_dropped_stream_is_not_active() {
        let (source, _feed) = ChannelLocationSource::new();
        let stream = source.watch(&LocationOptions::default()).unwrap();
        assert!(source.has_active_watch());

        drop(stream);
        assert!(!source.has_active_watch());
    }

    #[tokio::test]
    async fn test_one_shot_resolves_with_next_fix() {
        let (source, feed) = ChannelLocationSource::new();
        let options = LocationOptions::default();

        let request = source.current_position(&options);
        let pusher = async {
            tokio::task::yield_now().await;
            feed.push_fix(fix(19.4, -99.1));
        };

        let (result, _) = tokio::join!(request, pusher);
        assert_eq!(result, Ok(fix(19.4, -99.1)));
    }

    #[tokio::test]
    async fn test_one_shot_fails_with_platform_error() {
        let (source, feed) = ChannelLocationSource::new();
        let options = LocationOptions::default();

        let request = source.current_position(&options);
        let pusher = async {
            tokio::task::yield_now().await;
            feed.push_error(LocationError::PermissionDenied);
        };

        let (result, _) = tokio::join!(request, pusher);
        assert_eq!(result, Err(LocationError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_times_out() {
        let (source, _feed) = ChannelLocationSource::new();
        let options = LocationOptions {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };

        let result = source.current_position(&options).await;
        assert_eq!(result, Err(LocationError::Timeout));
        assert_eq!(source.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_requests_do_not_accumulate() {
        let (source, feed) = ChannelLocationSource::new();
        let options = LocationOptions {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };

        for _ in 0..5 {
            assert_eq!(
                source.current_position(&options).await,
                Err(LocationError::Timeout)
            );
        }
        assert_eq!(source.pending_requests(), 0);

        let live = source.current_position(&LocationOptions::default());
        let expected = fix(19.4, -99.1);
        let (result, ()) = tokio::join!(live, async {
            tokio::task::yield_now().await;
            feed.push_fix(expected);
        });
        assert_eq!(result, Ok(expected));
    }

    #[tokio::test]
    async fn test_one_shot_served_from_cache_when_allowed() {
        let (source, feed) = ChannelLocationSource::new();
        feed.push_fix(fix(19.4, -99.1));

        let options = LocationOptions {
            max_cache_age: Duration::from_secs(60),
            ..Default::default()
        };
        let result = source.current_position(&options).await;
        assert_eq!(result, Ok(fix(19.4, -99.1)));
    }
}
