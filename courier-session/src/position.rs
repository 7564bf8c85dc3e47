//! Position stream contract and in-process sources.
//!
//! A [`PositionSource`] delivers fixes into a [`FixSink`] from the moment
//! [`PositionSource::watch`] returns until the matching
//! [`PositionSource::clear_watch`]. The sink is a bounded queue; when it is
//! full the newest fix is dropped, since the worker will catch up on the
//! next one.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use courier_core::PositionFix;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::WatchOptions;

/// Failures reported by a position stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The user has not granted location access.
    #[error("Location permission denied. Please enable location access in your device settings.")]
    PermissionDenied,
    /// The platform cannot determine a position.
    #[error("Location information unavailable. Please check your GPS settings.")]
    Unavailable,
    /// No fix arrived within the watch timeout.
    #[error("Location request timed out. Please try again.")]
    Timeout,
    /// The stream ended.
    #[error("the position stream closed")]
    Closed,
    /// Any other platform failure.
    #[error("An unknown error occurred: {0}")]
    Other(String),
}

/// A fix or a stream failure, as delivered to a [`FixSink`].
pub type PositionUpdate = Result<PositionFix, PositionError>;

/// Identifies an active watch so it can be cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

/// Receiving end handed to a [`PositionSource`].
#[derive(Debug, Clone)]
pub struct FixSink {
    tx: mpsc::Sender<PositionUpdate>,
}

impl FixSink {
    /// Create a sink and the receiver it feeds.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PositionUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue `fix` without waiting.
    ///
    /// Returns `false` when the fix was dropped because the queue is full
    /// or the receiver has gone.
    #[must_use]
    pub fn push(&self, fix: PositionFix) -> bool {
        self.offer(Ok(fix))
    }

    /// Report a stream failure without waiting.
    ///
    /// Returns `false` when the report was dropped.
    #[must_use]
    pub fn fail(&self, error: PositionError) -> bool {
        self.offer(Err(error))
    }

    /// Queue `fix`, waiting for space.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::Closed`] when the receiver has gone.
    pub async fn send(&self, fix: PositionFix) -> Result<(), PositionError> {
        self.tx
            .send(Ok(fix))
            .await
            .map_err(|_| PositionError::Closed)
    }

    /// Whether the receiver has gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn offer(&self, update: PositionUpdate) -> bool {
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::debug!("fix queue full; dropping newest fix");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// A stream of position fixes.
pub trait PositionSource: Send + Sync {
    /// Start delivering fixes into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] when the stream cannot be started.
    fn watch(&self, options: &WatchOptions, sink: FixSink) -> Result<WatchId, PositionError>;

    /// Stop delivering fixes for `id`. Unknown ids are ignored.
    fn clear_watch(&self, id: WatchId);
}

#[derive(Debug, Default)]
struct ManualState {
    sinks: HashMap<WatchId, FixSink>,
    pending: Vec<PositionFix>,
    refuse_with: Option<PositionError>,
}

/// A source driven by hand.
///
/// Fixes pushed while nobody is watching are held and handed to the next
/// watcher, so a test can stage the first fix before starting a session.
///
/// # Examples
/// ```
/// use courier_core::PositionFix;
/// use courier_session::{FixSink, ManualPositionSource, PositionSource, WatchOptions};
///
/// let source = ManualPositionSource::default();
/// assert_eq!(source.push(PositionFix::new(51.5, -0.1)), 0);
///
/// let (sink, mut fixes) = FixSink::channel(4);
/// let id = source.watch(&WatchOptions::default(), sink)?;
/// assert!(matches!(fixes.try_recv(), Ok(Ok(_))));
///
/// source.clear_watch(id);
/// assert_eq!(source.active_watches(), 0);
/// # Ok::<(), courier_session::PositionError>(())
/// ```
#[derive(Debug, Default)]
pub struct ManualPositionSource {
    state: Mutex<ManualState>,
    next_id: AtomicU64,
}

impl ManualPositionSource {
    /// Make every subsequent `watch` fail with `error`.
    #[must_use]
    pub fn refusing(error: PositionError) -> Self {
        let source = Self::default();
        source.lock().refuse_with = Some(error);
        source
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sinks(&self) -> Vec<FixSink> {
        self.lock().sinks.values().cloned().collect()
    }

    /// Deliver `fix` to every watcher without waiting.
    ///
    /// Returns how many watchers accepted it. With no watchers the fix is
    /// held for the next one and `0` is returned.
    #[must_use]
    pub fn push(&self, fix: PositionFix) -> usize {
        let mut state = self.lock();
        if state.sinks.is_empty() {
            state.pending.push(fix);
            return 0;
        }
        state.sinks.values().filter(|sink| sink.push(fix)).count()
    }

    /// Deliver `fix` to every watcher, waiting for queue space.
    ///
    /// Returns how many watchers accepted it.
    #[must_use]
    pub async fn send(&self, fix: PositionFix) -> usize {
        let mut delivered = 0;
        for sink in self.sinks() {
            if sink.send(fix).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Report `error` to every watcher.
    pub fn fail(&self, error: &PositionError) {
        for sink in self.lock().sinks.values() {
            if !sink.fail(error.clone()) {
                log::debug!("position failure not delivered to a watcher");
            }
        }
    }

    /// End every watcher's stream, as a platform does when it drops a
    /// subscription. Closed watches no longer count as active.
    pub fn close_all(&self) {
        let closed = std::mem::take(&mut self.lock().sinks);
        log::debug!("closed {} manual watches", closed.len());
    }

    /// Number of watches not yet cleared.
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.lock().sinks.len()
    }
}

impl PositionSource for ManualPositionSource {
    fn watch(&self, options: &WatchOptions, sink: FixSink) -> Result<WatchId, PositionError> {
        let mut state = self.lock();
        if let Some(error) = &state.refuse_with {
            return Err(error.clone());
        }
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        for fix in state.pending.drain(..) {
            if !sink.push(fix) {
                log::debug!("held fix dropped by watch {}", id.0);
            }
        }
        log::debug!("manual watch {} started ({options:?})", id.0);
        state.sinks.insert(id, sink);
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        if self.lock().sinks.remove(&id).is_some() {
            log::debug!("manual watch {} cleared", id.0);
        }
    }
}

/// Replays a recorded trace at a fixed interval.
///
/// Each watch spawns a task on the current Tokio runtime that sends the
/// fixes in order, one per interval. Once the trace is exhausted the stream
/// stays open and quiet, like a receiver that stops reporting, until the
/// watch is cleared.
#[derive(Debug)]
pub struct ReplayPositionSource {
    fixes: Vec<PositionFix>,
    interval: Duration,
    watches: Mutex<HashMap<WatchId, CancellationToken>>,
    next_id: AtomicU64,
}

impl ReplayPositionSource {
    /// Replay `fixes`, one every `interval`.
    #[must_use]
    pub fn new(fixes: Vec<PositionFix>, interval: Duration) -> Self {
        Self {
            fixes,
            interval,
            watches: Mutex::default(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of fixes in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    /// Whether the trace is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    fn watches(&self) -> std::sync::MutexGuard<'_, HashMap<WatchId, CancellationToken>> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PositionSource for ReplayPositionSource {
    fn watch(&self, _options: &WatchOptions, sink: FixSink) -> Result<WatchId, PositionError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| PositionError::Other(format!("no async runtime: {err}")))?;
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        self.watches().insert(id, cancel.clone());

        let fixes = self.fixes.clone();
        let interval = self.interval;
        runtime.spawn(async move {
            for (index, fix) in fixes.into_iter().enumerate() {
                if index > 0 {
                    tokio::select! {
                        () = cancel.cancelled() => return,
                        () = tokio::time::sleep(interval) => {}
                    }
                }
                let sent = tokio::select! {
                    () = cancel.cancelled() => return,
                    sent = sink.send(fix) => sent,
                };
                if sent.is_err() {
                    return;
                }
            }
            log::debug!("replay watch {} finished its trace", id.0);
            cancel.cancelled().await;
            drop(sink);
        });
        Ok(id)
    }

    fn clear_watch(&self, id: WatchId) {
        if let Some(cancel) = self.watches().remove(&id) {
            cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn full_sink_drops_newest() {
        let (sink, mut rx) = FixSink::channel(1);
        assert!(sink.push(PositionFix::new(1.0, 1.0)));
        assert!(!sink.push(PositionFix::new(2.0, 2.0)));
        let kept = rx.try_recv().expect("one fix queued");
        assert_eq!(kept.map(|fix| fix.lat), Ok(1.0));
        assert!(rx.try_recv().is_err());
    }

    #[rstest]
    fn closed_sink_reports_drop() {
        let (sink, rx) = FixSink::channel(4);
        drop(rx);
        assert!(sink.is_closed());
        assert!(!sink.push(PositionFix::new(0.0, 0.0)));
    }

    #[rstest]
    fn refusing_source_fails_watch() {
        let source = ManualPositionSource::refusing(PositionError::PermissionDenied);
        let (sink, _rx) = FixSink::channel(1);
        let err = source.watch(&WatchOptions::default(), sink).unwrap_err();
        assert_eq!(err, PositionError::PermissionDenied);
        assert_eq!(source.active_watches(), 0);
    }

    #[rstest]
    fn manual_source_fans_out_to_watchers() {
        let source = ManualPositionSource::default();
        let (first, mut first_rx) = FixSink::channel(4);
        let (second, mut second_rx) = FixSink::channel(4);
        let first_id = source.watch(&WatchOptions::default(), first).expect("watch");
        source.watch(&WatchOptions::default(), second).expect("watch");

        assert_eq!(source.push(PositionFix::new(1.0, 2.0)), 2);
        assert!(first_rx.try_recv().is_ok());
        assert!(second_rx.try_recv().is_ok());

        source.clear_watch(first_id);
        assert_eq!(source.push(PositionFix::new(1.0, 2.0)), 1);
        assert!(first_rx.try_recv().is_err());
    }

    #[rstest]
    fn position_errors_read_like_the_app() {
        assert_eq!(
            PositionError::Timeout.to_string(),
            "Location request timed out. Please try again."
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn replay_goes_quiet_after_trace_until_cleared() {
        let trace = vec![PositionFix::new(0.0, 0.0), PositionFix::new(0.0, 0.001)];
        let source = ReplayPositionSource::new(trace, Duration::from_secs(1));
        let (sink, mut rx) = FixSink::channel(4);
        let id = source.watch(&WatchOptions::default(), sink).expect("watch");

        let mut received = Vec::new();
        for _ in 0..2 {
            received.push(rx.recv().await.expect("open").expect("fix"));
        }
        assert_eq!(received.last().map(|fix| fix.lng), Some(0.001));

        let quiet = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(quiet.is_err(), "stream should stay open and quiet");

        source.clear_watch(id);
        assert!(rx.recv().await.is_none());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn cleared_replay_stops_sending() {
        let trace = vec![PositionFix::new(0.0, 0.0); 5];
        let source = ReplayPositionSource::new(trace, Duration::from_secs(1));
        let (sink, mut rx) = FixSink::channel(8);
        let id = source.watch(&WatchOptions::default(), sink).expect("watch");

        assert!(rx.recv().await.is_some());
        source.clear_watch(id);
        assert!(rx.recv().await.is_none());
    }
}
