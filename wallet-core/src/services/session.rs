//! Session manager - login, register-then-login, logout
//!
//! A successful login replaces the whole client state (old timer first, then
//! the state swap) before the first refresh starts, so nothing issued under a
//! previous session can write into the new one.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::{Session, SessionId, StateEvent};
use crate::ports::WalletApi;
use crate::services::logging::{record, LogEvent, LoggingService};
use crate::services::poller::PollingScheduler;
use crate::services::refresh::{lock_state, SharedState};

pub struct SessionManager {
    api: Arc<dyn WalletApi>,
    state: SharedState,
    poller: Arc<PollingScheduler>,
    logger: Option<Arc<LoggingService>>,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn WalletApi>,
        state: SharedState,
        poller: Arc<PollingScheduler>,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        Self {
            api,
            state,
            poller,
            logger,
        }
    }

    /// Log in and run the first visible refresh.
    ///
    /// A rejected login leaves the state untouched. If the first refresh
    /// cannot load profile, balance or history, the new session is torn down
    /// again and the failure is reported as an authentication error.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let token = match self.api.login(username, password).await {
            Ok(token) => token,
            Err(e) => return Err(self.login_failed(username, e.to_string())),
        };

        let session = Session::new(token);
        self.poller.stop();
        lock_state(&self.state).apply(StateEvent::SignedIn(session.clone()));

        let report = self.poller.start(&session).await;

        if let Some(failure) = report.essential_failure() {
            let message = failure.message.clone();
            self.end(session.id());
            return Err(self.login_failed(username, message));
        }
        if report.discarded {
            // Logged out or replaced by another login while loading
            return Err(self.login_failed(username, "Session ended before sign-in completed".to_string()));
        }

        record(&self.logger, LogEvent::new("login_succeeded").with_username(username));
        Ok(session)
    }

    /// Create the account, then log in with the same credentials.
    /// A rejected registration leaves the state untouched.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        if let Err(e) = self.api.register(username, email, password).await {
            let message = e.to_string();
            record(
                &self.logger,
                LogEvent::new("registration_failed")
                    .with_username(username)
                    .with_error(message.clone()),
            );
            return Err(Error::Registration(message));
        }

        self.login(username, password).await
    }

    /// Stop polling, then clear session, identity and snapshot
    pub fn logout(&self) {
        self.poller.stop();

        let was_signed_in = {
            let mut state = lock_state(&self.state);
            let was_signed_in = state.session().is_some();
            state.apply(StateEvent::SignedOut);
            was_signed_in
        };

        if was_signed_in {
            record(&self.logger, LogEvent::new("logged_out"));
        }
    }

    /// Tear down `id` if, and only if, it is still the current session
    fn end(&self, id: SessionId) {
        self.poller.stop_for(id);
        let mut state = lock_state(&self.state);
        if state.is_current(id) {
            state.apply(StateEvent::SignedOut);
        }
    }

    fn login_failed(&self, username: &str, message: String) -> Error {
        record(
            &self.logger,
            LogEvent::new("login_failed")
                .with_username(username)
                .with_error(message.clone()),
        );
        Error::Auth(message)
    }
}
