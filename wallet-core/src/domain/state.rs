//! Client state machine
//!
//! `ClientState` is the single owner of session, identity and snapshot. Every
//! mutation is expressed as a `StateEvent`. Events produced by network calls
//! carry the `SessionId` they were issued under; if that session is no longer
//! current when the event arrives, it is dropped.

use super::{Identity, Session, SessionId, Transaction, WalletSnapshot};

/// Everything that exists only while somebody is signed in
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session: Session,
    /// Unknown until the first profile fetch lands
    pub identity: Option<Identity>,
    pub snapshot: WalletSnapshot,
    /// Visible refreshes still running; the loading flag clears at zero
    visible_refreshes: u32,
}

/// Snapshot and identity exist if and only if a session does
#[derive(Debug, Clone, Default)]
pub enum ClientState {
    #[default]
    SignedOut,
    SignedIn(ActiveSession),
}

/// A state transition
#[derive(Debug, Clone)]
pub enum StateEvent {
    /// Replace whatever was there with a fresh session and a cleared snapshot
    SignedIn(Session),
    SignedOut,
    IdentityFetched(SessionId, Identity),
    BalanceFetched(SessionId, String),
    AddressFetched(SessionId, String),
    HistoryFetched(SessionId, Vec<Transaction>),
    LoadingStarted(SessionId),
    LoadingFinished(SessionId),
}

impl StateEvent {
    /// Session this event was issued under, if it is session-scoped
    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            StateEvent::SignedIn(_) | StateEvent::SignedOut => None,
            StateEvent::IdentityFetched(id, _)
            | StateEvent::BalanceFetched(id, _)
            | StateEvent::AddressFetched(id, _)
            | StateEvent::HistoryFetched(id, _)
            | StateEvent::LoadingStarted(id)
            | StateEvent::LoadingFinished(id) => Some(*id),
        }
    }
}

impl ClientState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            ClientState::SignedIn(active) => Some(&active.session),
            ClientState::SignedOut => None,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session().map(Session::id)
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.session_id() == Some(id)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ClientState::SignedIn(active) => active.identity.as_ref(),
            ClientState::SignedOut => None,
        }
    }

    pub fn snapshot(&self) -> Option<&WalletSnapshot> {
        match self {
            ClientState::SignedIn(active) => Some(&active.snapshot),
            ClientState::SignedOut => None,
        }
    }

    /// Apply an event. Returns false if it was discarded as stale.
    pub fn apply(&mut self, event: StateEvent) -> bool {
        match event {
            StateEvent::SignedIn(session) => {
                *self = ClientState::SignedIn(ActiveSession {
                    session,
                    identity: None,
                    snapshot: WalletSnapshot::default(),
                    visible_refreshes: 0,
                });
                true
            }
            StateEvent::SignedOut => {
                *self = ClientState::SignedOut;
                true
            }
            event => self.apply_scoped(event),
        }
    }

    fn apply_scoped(&mut self, event: StateEvent) -> bool {
        let Some(id) = event.session_id() else {
            return false;
        };
        let ClientState::SignedIn(active) = self else {
            return false;
        };
        if active.session.id() != id {
            return false;
        }

        match event {
            StateEvent::IdentityFetched(_, identity) => active.identity = Some(identity),
            StateEvent::BalanceFetched(_, balance) => active.snapshot.balance = balance,
            StateEvent::AddressFetched(_, address) => {
                // Already-known addresses are never overwritten
                active.snapshot.address.fill(address);
            }
            StateEvent::HistoryFetched(_, transactions) => active.snapshot.transactions = transactions,
            StateEvent::LoadingStarted(_) => {
                active.visible_refreshes += 1;
                active.snapshot.transactions_loading = true;
            }
            StateEvent::LoadingFinished(_) => {
                active.visible_refreshes = active.visible_refreshes.saturating_sub(1);
                active.snapshot.transactions_loading = active.visible_refreshes > 0;
            }
            StateEvent::SignedIn(_) | StateEvent::SignedOut => return false,
        }
        true
    }
}
