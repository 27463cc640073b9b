//! Polling scheduler - keep the snapshot fresh while a session is active
//!
//! Idle until `start`, which runs one visible refresh and then arms a timer
//! that runs a silent refresh every period. At most one timer exists: arming
//! for a new session aborts the previous one, and `stop` aborts it outright.
//! Ticks do not wait for earlier refreshes to finish.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::domain::{Session, SessionId};
use crate::services::refresh::{RefreshMode, RefreshReport, SnapshotRefresher};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

struct ArmedTimer {
    session_id: SessionId,
    handle: JoinHandle<()>,
}

pub struct PollingScheduler {
    refresher: Arc<SnapshotRefresher>,
    interval: Duration,
    timer: Mutex<Option<ArmedTimer>>,
}

impl PollingScheduler {
    pub fn new(refresher: Arc<SnapshotRefresher>, interval: Duration) -> Self {
        Self {
            refresher,
            interval,
            timer: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Session the timer is currently armed for
    pub fn armed_session(&self) -> Option<SessionId> {
        self.lock_timer()
            .as_ref()
            .filter(|armed| !armed.handle.is_finished())
            .map(|armed| armed.session_id)
    }

    /// Enter `Active(session)`: disarm whatever was running, refresh once
    /// with the loading indicator, then arm the periodic timer if the
    /// session is still current.
    pub async fn start(&self, session: &Session) -> RefreshReport {
        self.stop();

        let report = self.refresher.refresh(session, RefreshMode::Visible).await;

        if self.refresher.is_current(session.id()) {
            self.arm(session);
        }

        report
    }

    /// Arm the periodic timer for `session`. A no-op if it is already armed
    /// for that session; any timer for another session is aborted first.
    pub fn arm(&self, session: &Session) {
        let mut timer = self.lock_timer();

        if let Some(armed) = timer.as_ref() {
            if armed.session_id == session.id() && !armed.handle.is_finished() {
                return;
            }
        }
        if let Some(previous) = timer.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(run_timer(
            Arc::clone(&self.refresher),
            session.clone(),
            self.interval,
        ));
        *timer = Some(ArmedTimer {
            session_id: session.id(),
            handle,
        });
    }

    /// Back to `Idle`. Aborts the timer and any refresh it still has in flight.
    pub fn stop(&self) {
        if let Some(armed) = self.lock_timer().take() {
            armed.handle.abort();
        }
    }

    /// Disarm only if the timer belongs to `session_id`
    pub fn stop_for(&self, session_id: SessionId) {
        let mut timer = self.lock_timer();
        if timer.as_ref().is_some_and(|armed| armed.session_id == session_id) {
            if let Some(armed) = timer.take() {
                armed.handle.abort();
            }
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<ArmedTimer>> {
        self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(refresher: Arc<SnapshotRefresher>, session: Session, period: Duration) {
    // First tick one full period after the visible refresh
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Dropped together with this task on abort, which aborts its members
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !refresher.is_current(session.id()) {
                    break;
                }
                let refresher = Arc::clone(&refresher);
                let session = session.clone();
                in_flight.spawn(async move {
                    refresher.refresh(&session, RefreshMode::Silent).await;
                });
            }
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
}
