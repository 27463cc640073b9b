//! Snapshot refresher - pull profile, balance, address and history
//!
//! Each sub-fetch fails on its own: a failed balance fetch leaves the
//! previous balance in place and does not stop the history fetch. Every
//! write goes through `ClientState::apply` tagged with the session the
//! refresh was started for, so results that land after logout or re-login
//! are dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::{ClientState, Session, SessionId, StateEvent};
use crate::ports::{ApiError, WalletApi};
use crate::services::logging::{record, LogEvent, LoggingService};
use crate::services::resolver::resolve_address;

/// Client state shared between the controller and background refreshes
pub type SharedState = Arc<Mutex<ClientState>>;

/// Lock the shared state. A poisoned lock still holds a consistent
/// `ClientState` because every mutation is a single `apply`.
pub(crate) fn lock_state(state: &SharedState) -> MutexGuard<'_, ClientState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Whether the loading indicator is toggled during the refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Visible,
    Silent,
}

/// Which part of the snapshot a fetch feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Profile,
    Balance,
    Address,
    History,
}

impl SnapshotSource {
    /// Endpoint name as recorded in the event log
    pub fn endpoint(&self) -> &'static str {
        match self {
            SnapshotSource::Profile => "profile",
            SnapshotSource::Balance => "balance",
            SnapshotSource::Address => "wallet_address",
            SnapshotSource::History => "transaction_history",
        }
    }

    /// The address can also be recovered from history, so its fetch is
    /// the only one a fresh session can do without.
    pub fn is_essential(&self) -> bool {
        !matches!(self, SnapshotSource::Address)
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshFailure {
    pub source: SnapshotSource,
    pub message: String,
}

/// Outcome of one refresh cycle
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    #[serde(skip)]
    pub session_id: SessionId,
    pub failures: Vec<RefreshFailure>,
    /// At least one result arrived after its session stopped being current
    pub discarded: bool,
}

impl RefreshReport {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            failures: Vec::new(),
            discarded: false,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.discarded
    }

    /// First failure that leaves a fresh session without a usable snapshot
    pub fn essential_failure(&self) -> Option<&RefreshFailure> {
        self.failures.iter().find(|f| f.source.is_essential())
    }
}

/// Runs refresh cycles against the wallet service
pub struct SnapshotRefresher {
    api: Arc<dyn WalletApi>,
    state: SharedState,
    logger: Option<Arc<LoggingService>>,
    /// Number of completed cycles, for observers
    cycles: watch::Sender<u64>,
}

impl SnapshotRefresher {
    pub fn new(api: Arc<dyn WalletApi>, state: SharedState, logger: Option<Arc<LoggingService>>) -> Self {
        let (cycles, _) = watch::channel(0);
        Self {
            api,
            state,
            logger,
            cycles,
        }
    }

    /// Notified after every completed cycle, stale ones included
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cycles.subscribe()
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        lock_state(&self.state).is_current(id)
    }

    /// Run one cycle for `session`: profile, balance, address (only while
    /// unknown), then history. Failures are recorded in the report and the
    /// event log, never raised.
    pub async fn refresh(&self, session: &Session, mode: RefreshMode) -> RefreshReport {
        let id = session.id();
        let token = session.token();
        let mut report = RefreshReport::new(id);

        if mode == RefreshMode::Visible {
            self.apply(&mut report, StateEvent::LoadingStarted(id));
        }

        match self.api.profile(token).await {
            Ok(identity) => self.apply(&mut report, StateEvent::IdentityFetched(id, identity)),
            Err(e) => self.fail(&mut report, SnapshotSource::Profile, e),
        }

        match self.api.balance(token).await {
            Ok(balance) => self.apply(&mut report, StateEvent::BalanceFetched(id, balance)),
            Err(e) => self.fail(&mut report, SnapshotSource::Balance, e),
        }

        if self.address_unknown(id) {
            match self.api.wallet_address(token).await {
                Ok(Some(address)) => self.apply(&mut report, StateEvent::AddressFetched(id, address)),
                Ok(None) => {}
                Err(e) => self.fail(&mut report, SnapshotSource::Address, e),
            }
        }

        match self.api.transaction_history(token).await {
            Ok(transactions) => {
                let inferred = if self.address_unknown(id) {
                    resolve_address(&transactions)
                } else {
                    None
                };
                self.apply(&mut report, StateEvent::HistoryFetched(id, transactions));
                if let Some(address) = inferred {
                    self.apply(&mut report, StateEvent::AddressFetched(id, address));
                }
            }
            Err(e) => self.fail(&mut report, SnapshotSource::History, e),
        }

        if mode == RefreshMode::Visible {
            self.apply(&mut report, StateEvent::LoadingFinished(id));
        }

        self.cycles.send_modify(|n| *n += 1);

        if report.discarded {
            record(
                &self.logger,
                LogEvent::new("refresh_discarded").with_error_details(format!("session {}", id)),
            );
        }

        report
    }

    /// False for stale sessions as well as known addresses, so a stale
    /// refresh skips the lookup entirely.
    fn address_unknown(&self, id: SessionId) -> bool {
        let state = lock_state(&self.state);
        state.is_current(id) && state.snapshot().is_some_and(|s| !s.address.is_known())
    }

    fn apply(&self, report: &mut RefreshReport, event: StateEvent) {
        if !lock_state(&self.state).apply(event) {
            report.discarded = true;
        }
    }

    fn fail(&self, report: &mut RefreshReport, source: SnapshotSource, error: ApiError) {
        let message = error.to_string();
        record(
            &self.logger,
            LogEvent::new("refresh_failed")
                .with_endpoint(source.endpoint())
                .with_error(message.clone()),
        );
        report.failures.push(RefreshFailure { source, message });
    }
}
