//! Wallet Core - state synchronization for a custodial wallet client
//!
//! This crate implements the client logic following hexagonal architecture:
//!
//! - **domain**: Session, snapshot, transactions and the `ClientState` machine
//! - **ports**: Trait definition for the remote wallet service (`WalletApi`)
//! - **services**: Session lifecycle, refresh, polling, transfers, history views
//! - **adapters**: Concrete implementations (reqwest HTTP client)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use adapters::http::HttpWalletApi;
use config::Config;
use services::refresh::lock_state;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, ValidationError};
pub use domain::{ClientState, Direction, Identity, SessionId, Transaction, WalletAddress, WalletSnapshot};
pub use ports::WalletApi;
pub use services::{HistoryFilter, HistorySort, RefreshReport, TransferReceipt};

/// Controller owning the client state
///
/// Every operation of the client goes through here. Background polling runs
/// on the tokio runtime this client was used from and stops on `logout`, on
/// the next `login`, or when the client is dropped.
pub struct WalletClient {
    state: SharedState,
    refresher: Arc<SnapshotRefresher>,
    poller: Arc<PollingScheduler>,
    sessions: SessionManager,
    transfers: TransferCoordinator,
}

impl WalletClient {
    pub fn new(api: Arc<dyn WalletApi>, config: &Config, logger: Option<Arc<LoggingService>>) -> Self {
        Self::with_interval(api, config.poll_interval, logger)
    }

    pub fn with_interval(
        api: Arc<dyn WalletApi>,
        poll_interval: Duration,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        let state: SharedState = Arc::new(Mutex::new(ClientState::default()));
        let refresher = Arc::new(SnapshotRefresher::new(
            Arc::clone(&api),
            Arc::clone(&state),
            logger.clone(),
        ));
        let poller = Arc::new(PollingScheduler::new(Arc::clone(&refresher), poll_interval));
        let sessions = SessionManager::new(
            Arc::clone(&api),
            Arc::clone(&state),
            Arc::clone(&poller),
            logger.clone(),
        );
        let transfers = TransferCoordinator::new(api, Arc::clone(&state), Arc::clone(&refresher), logger);

        Self {
            state,
            refresher,
            poller,
            sessions,
            transfers,
        }
    }

    /// Log in, load the first snapshot and start polling
    pub async fn login(&self, username: &str, password: &str) -> domain::result::Result<Identity> {
        let session = self.sessions.login(username, password).await?;
        self.identity_for(session.id())
    }

    /// Create an account and log straight into it
    pub async fn register(&self, username: &str, email: &str, password: &str) -> domain::result::Result<Identity> {
        let session = self.sessions.register(username, email, password).await?;
        self.identity_for(session.id())
    }

    pub fn logout(&self) {
        self.sessions.logout();
    }

    /// Validate and submit a transfer, then refresh before returning
    pub async fn send(&self, to: &str, amount_eth: &str) -> domain::result::Result<TransferReceipt> {
        self.transfers.send(to, amount_eth).await
    }

    /// One visible refresh outside the polling cadence
    pub async fn refresh_now(&self) -> domain::result::Result<RefreshReport> {
        let session = lock_state(&self.state)
            .session()
            .cloned()
            .ok_or(ValidationError::Unauthenticated)?;
        Ok(self.refresher.refresh(&session, RefreshMode::Visible).await)
    }

    /// Current snapshot; the cleared default while signed out
    pub fn snapshot(&self) -> WalletSnapshot {
        lock_state(&self.state).snapshot().cloned().unwrap_or_default()
    }

    pub fn identity(&self) -> Option<Identity> {
        lock_state(&self.state).identity().cloned()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        lock_state(&self.state).session_id()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session_id().is_some()
    }

    /// Filtered and sorted copy of the current history
    pub fn history(&self, filter: HistoryFilter, sort: HistorySort) -> Vec<Transaction> {
        let state = lock_state(&self.state);
        match state.snapshot() {
            Some(snapshot) => view(&snapshot.transactions, filter, sort).into_iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poller.interval()
    }

    /// Whether the periodic timer is running
    pub fn is_polling(&self) -> bool {
        self.poller.armed_session().is_some()
    }

    /// Counter bumped after every refresh cycle, polled or manual
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.refresher.subscribe()
    }

    fn identity_for(&self, id: SessionId) -> domain::result::Result<Identity> {
        let state = lock_state(&self.state);
        state
            .is_current(id)
            .then(|| state.identity().cloned())
            .flatten()
            .ok_or_else(|| Error::auth("Session ended before sign-in completed"))
    }
}

/// Everything a front-end needs, wired from one wallet directory
pub struct WalletContext {
    pub wallet_dir: PathBuf,
    pub config: Config,
    pub logger: Option<Arc<LoggingService>>,
    pub client: WalletClient,
}

impl WalletContext {
    /// Load settings from `wallet_dir` and connect an HTTP client to the
    /// configured service
    pub fn new(wallet_dir: &Path, logger: Option<Arc<LoggingService>>) -> Result<Self> {
        let config = Config::load(wallet_dir)?;
        let api = HttpWalletApi::new(&config.api_url, config.request_timeout)?;
        let client = WalletClient::new(Arc::new(api), &config, logger.clone());

        Ok(Self {
            wallet_dir: wallet_dir.to_path_buf(),
            config,
            logger,
            client,
        })
    }
}
