//! User activity tracking, silent refresh and idle logout
//!
//! An [`Activation`] owns one listener task. Signals arrive over an
//! unbounded channel, so the last-activity timestamp is only ever read and
//! written by that task.

use crate::manager::SessionManager;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// User interactions that count as activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySignal {
    PointerMove,
    KeyPress,
    Scroll,
}

/// Last-activity bookkeeping
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActivityTracker {
    last: Instant,
    refresh_after: Duration,
}

impl ActivityTracker {
    pub(crate) const fn new(now: Instant, refresh_after: Duration) -> Self {
        Self {
            last: now,
            refresh_after,
        }
    }

    /// Record activity at `now`, returning true if the previous activity is
    /// older than the refresh threshold
    pub(crate) fn record(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed > self.refresh_after
    }
}

/// Cloneable handle for reporting activity to an [`Activation`]
#[derive(Debug, Clone)]
pub struct ActivitySender {
    tx: mpsc::UnboundedSender<ActivitySignal>,
}

impl ActivitySender {
    /// Report one interaction; returns false once the activation is torn down
    pub fn signal(&self, signal: ActivitySignal) -> bool {
        self.tx.send(signal).is_ok()
    }
}

/// Installed activity listener and idle timer
///
/// Dropping the handle (or calling [`Activation::deactivate`]) removes both.
#[derive(Debug)]
pub struct Activation {
    signals: ActivitySender,
    cancel: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl Activation {
    /// A sender to hand to whatever produces input events
    pub fn signals(&self) -> ActivitySender {
        self.signals.clone()
    }

    pub fn signal(&self, signal: ActivitySignal) -> bool {
        self.signals.signal(signal)
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Tear down and wait for the listener task to exit
    pub async fn deactivate(mut self) {
        self.cancel.cancel();
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.await {
                debug!(error = %e, "Activity listener ended abnormally");
            }
        }
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Roughly 30 years; stands in for an idle timeout too large to represent
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn idle_deadline(now: Instant, idle_timeout: Duration) -> Instant {
    now.checked_add(idle_timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

pub(crate) fn spawn_listener(manager: SessionManager) -> Activation {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let listener = tokio::spawn(listen(manager, rx, cancel.clone()));

    Activation {
        signals: ActivitySender { tx },
        cancel,
        listener: Some(listener),
    }
}

async fn listen(
    manager: SessionManager,
    mut signals: mpsc::UnboundedReceiver<ActivitySignal>,
    cancel: CancellationToken,
) {
    let policy = manager.policy();

    // Activation itself counts as the first activity
    let start = Instant::now();
    let mut tracker = ActivityTracker::new(start, policy.refresh_after);
    let idle = sleep_until(idle_deadline(start, policy.idle_timeout));
    tokio::pin!(idle);
    let mut armed = true;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            received = signals.recv() => {
                let Some(signal) = received else { break };
                let now = Instant::now();
                if tracker.record(now) {
                    debug!(?signal, "Activity after quiet period, refreshing token");
                    manager.spawn_refresh();
                }
                idle.as_mut().reset(idle_deadline(now, policy.idle_timeout));
                armed = true;
            }
            () = &mut idle, if armed => {
                armed = false;
                manager.spawn_idle_logout();
            }
        }
    }

    debug!("Activity listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockAuthApi;
    use crate::claims::tests::token_for;
    use crate::manager::tests::{GatedApi, settle};
    use crate::state::{SessionPolicy, SessionStatus};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_tracker_flags_stale_activity() {
        let start = Instant::now();
        let mut tracker = ActivityTracker::new(start, 5 * MINUTE);

        assert!(!tracker.record(start + MINUTE));
        assert!(!tracker.record(start + 6 * MINUTE));
        assert!(tracker.record(start + 12 * MINUTE));
        // exactly at the threshold is not stale
        assert!(!tracker.record(start + 17 * MINUTE));
    }

    /// Signed in before activation, so no restore runs
    fn logged_in_manager(api: MockAuthApi) -> SessionManager {
        let manager = SessionManager::new(Arc::new(api), SessionPolicy::default());
        manager.login(token_for("u1", "user")).unwrap();
        manager
    }

    fn count_logouts(api: &mut MockAuthApi) -> Arc<AtomicUsize> {
        let logouts = Arc::new(AtomicUsize::new(0));
        let counter = logouts.clone();
        api.expect_logout().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        logouts
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_logs_out() {
        let mut api = MockAuthApi::new();
        let logouts = count_logouts(&mut api);
        let manager = logged_in_manager(api);
        let _activation = manager.activate();
        settle().await;

        advance(60 * MINUTE - Duration::from_secs(1)).await;
        settle().await;
        assert!(manager.snapshot().is_authenticated());

        advance(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(
            manager.snapshot().status(),
            SessionStatus::Unauthenticated
        );
        assert_eq!(logouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_postpones_idle_logout() {
        let mut api = MockAuthApi::new();
        api.expect_refresh()
            .returning(|| Ok(token_for("u1", "user")));
        let logouts = count_logouts(&mut api);
        let manager = logged_in_manager(api);
        let activation = manager.activate();
        settle().await;

        advance(30 * MINUTE).await;
        assert!(activation.signal(ActivitySignal::KeyPress));
        settle().await;

        // past the original deadline, inside the re-armed one
        advance(31 * MINUTE).await;
        settle().await;
        assert!(manager.snapshot().is_authenticated());
        assert_eq!(logouts.load(Ordering::SeqCst), 0);

        advance(30 * MINUTE).await;
        settle().await;
        assert!(manager.snapshot().is_empty());
        assert_eq!(logouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_without_session_is_ignored() {
        let mut api = MockAuthApi::new();
        api.expect_refresh().returning(|| {
            Err(trek_http::ClientError::AuthenticationFailed(String::new()))
        });
        let logouts = count_logouts(&mut api);
        let manager = SessionManager::new(Arc::new(api), SessionPolicy::default());
        let _activation = manager.activate();
        settle().await;
        assert!(manager.snapshot().is_empty());
        // the failed restore
        assert_eq!(logouts.load(Ordering::SeqCst), 1);

        advance(61 * MINUTE).await;
        settle().await;

        assert_eq!(logouts.load(Ordering::SeqCst), 1);
        assert_eq!(
            manager.snapshot().status(),
            SessionStatus::Unauthenticated
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_stale_signals_refresh_once() {
        let api = GatedApi::new(token_for("u1", "user"));
        let manager = SessionManager::new(api.clone(), SessionPolicy::default());
        let activation = manager.activate();
        settle().await;
        // the restore refresh is parked on the gate
        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        assert!(manager.snapshot().loading());
        api.gate.notify_one();
        settle().await;
        assert!(manager.snapshot().is_authenticated());

        advance(6 * MINUTE).await;
        assert!(activation.signal(ActivitySignal::PointerMove));
        settle().await;
        assert!(manager.refresh_in_flight());

        advance(6 * MINUTE).await;
        assert!(activation.signals().signal(ActivitySignal::KeyPress));
        settle().await;

        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 2);
        api.gate.notify_one();
        settle().await;
        assert!(!manager.refresh_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_activity_does_not_refresh() {
        let api = GatedApi::new(token_for("u1", "user"));
        let manager = SessionManager::new(api.clone(), SessionPolicy::default());
        manager.login(token_for("u1", "user")).unwrap();
        let activation = manager.activate();
        settle().await;

        for _ in 0..5 {
            advance(4 * MINUTE).await;
            activation.signal(ActivitySignal::Scroll);
            settle().await;
        }

        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_activation_restores_once() {
        let api = GatedApi::new(token_for("u1", "user"));
        let manager = SessionManager::new(api.clone(), SessionPolicy::default());

        let first = manager.activate();
        drop(first);
        let _second = manager.activate();
        settle().await;
        api.gate.notify_one();
        settle().await;

        assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
        assert!(manager.has_attempted_restore());
        assert!(manager.snapshot().is_authenticated());
    }

    #[test]
    fn test_idle_deadline_saturates() {
        let now = Instant::now();
        assert_eq!(idle_deadline(now, MINUTE), now + MINUTE);
        assert_eq!(idle_deadline(now, Duration::MAX), now + FAR_FUTURE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_idle_timeout_keeps_listener_alive() {
        let mut api = MockAuthApi::new();
        api.expect_refresh()
            .returning(|| Ok(token_for("u1", "user")));
        let logouts = count_logouts(&mut api);
        let manager = SessionManager::new(
            Arc::new(api),
            SessionPolicy {
                idle_timeout: Duration::from_secs(u64::MAX),
                ..SessionPolicy::default()
            },
        );
        manager.login(token_for("u1", "user")).unwrap();
        let activation = manager.activate();
        settle().await;

        assert!(activation.signal(ActivitySignal::KeyPress));
        settle().await;
        advance(6 * MINUTE).await;
        assert!(activation.signal(ActivitySignal::Scroll));
        settle().await;

        assert!(activation.is_active());
        assert!(activation.signal(ActivitySignal::PointerMove));
        assert!(manager.snapshot().is_authenticated());
        assert_eq!(logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_stops_idle_timer() {
        let mut api = MockAuthApi::new();
        let logouts = count_logouts(&mut api);
        let manager = logged_in_manager(api);
        let activation = manager.activate();
        let sender = activation.signals();
        settle().await;

        activation.deactivate().await;
        assert!(!sender.signal(ActivitySignal::Scroll));

        advance(2 * 60 * MINUTE).await;
        settle().await;
        assert!(manager.snapshot().is_authenticated());
        assert_eq!(logouts.load(Ordering::SeqCst), 0);
    }
}
