//! End-to-end client flows against an in-memory wallet service
//!
//! The service is faked at the `WalletApi` trait level so tests can count
//! calls, hold a request open, and run polling on a paused clock.
//!
//! Run with: cargo test --test session_flow_test

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use wallet_core::ports::{ApiError, ApiResult, TransferAck, TransferRequest};
use wallet_core::{
    Direction, Error, HistoryFilter, HistorySort, Identity, Transaction, ValidationError, WalletAddress,
    WalletApi, WalletClient,
};

const ALICE_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
const BOB_ADDRESS: &str = "0x2222222222222222222222222222222222222222";
const POLL: Duration = Duration::from_secs(5);

struct Ledger {
    users: Vec<(String, String, String)>,
    balance: Decimal,
    expose_address: bool,
    transactions: Vec<Transaction>,
    fail_history: bool,
    fail_balance: bool,
    issued_tokens: usize,
}

/// In-memory wallet service
struct FakeWalletApi {
    ledger: Mutex<Ledger>,
    calls: AtomicUsize,
    balance_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    /// When set, the next balance request waits for it
    balance_gate: Mutex<Option<Arc<Notify>>>,
    balance_entered: Notify,
}

impl FakeWalletApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            ledger: Mutex::new(Ledger {
                users: vec![("alice".into(), "a@x.com".into(), "secret".into())],
                balance: Decimal::from_str("1.5000").unwrap(),
                expose_address: false,
                transactions: vec![Transaction {
                    hash: "0xaa".into(),
                    from: ALICE_ADDRESS.into(),
                    to: BOB_ADDRESS.into(),
                    value_eth: "0.5".into(),
                    timestamp: 1000,
                    direction: Direction::Outgoing,
                }],
                fail_history: false,
                fail_balance: false,
                issued_tokens: 0,
            }),
            calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            balance_gate: Mutex::new(None),
            balance_entered: Notify::new(),
        })
    }

    fn ledger(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap()
    }

    /// Hold the next balance request until the returned handle is notified
    fn gate_next_balance(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.balance_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn authorize(&self, token: &str) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token.starts_with("token-") {
            Ok(())
        } else {
            Err(ApiError::rejected(401, "Missing or invalid token"))
        }
    }
}

#[async_trait]
impl WalletApi for FakeWalletApi {
    async fn register(&self, username: &str, email: &str, password: &str) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut ledger = self.ledger();
        if ledger.users.iter().any(|(u, e, _)| u == username || e == email) {
            return Err(ApiError::rejected(409, "User with that username or email already exists"));
        }
        ledger.users.push((username.into(), email.into(), password.into()));
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut ledger = self.ledger();
        if !ledger.users.iter().any(|(u, _, p)| u == username && p == password) {
            return Err(ApiError::rejected(401, "Invalid username or password"));
        }
        ledger.issued_tokens += 1;
        Ok(format!("token-{}", ledger.issued_tokens))
    }

    async fn profile(&self, token: &str) -> ApiResult<Identity> {
        self.authorize(token)?;
        Ok(Identity::new("alice", "a@x.com"))
    }

    async fn balance(&self, token: &str) -> ApiResult<String> {
        self.authorize(token)?;
        self.balance_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.balance_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.balance_entered.notify_one();
            gate.notified().await;
        }

        let ledger = self.ledger();
        if ledger.fail_balance {
            return Err(ApiError::rejected(500, "Failed to fetch balance"));
        }
        Ok(ledger.balance.to_string())
    }

    async fn wallet_address(&self, token: &str) -> ApiResult<Option<String>> {
        self.authorize(token)?;
        let ledger = self.ledger();
        Ok(ledger.expose_address.then(|| ALICE_ADDRESS.to_string()))
    }

    async fn transaction_history(&self, token: &str) -> ApiResult<Vec<Transaction>> {
        self.authorize(token)?;
        let ledger = self.ledger();
        if ledger.fail_history {
            return Err(ApiError::Transport("Unable to connect to the wallet service".into()));
        }
        Ok(ledger.transactions.clone())
    }

    async fn submit_transfer(&self, token: &str, request: &TransferRequest) -> ApiResult<TransferAck> {
        self.authorize(token)?;
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        let wei = Decimal::from_str(&request.value).map_err(|e| ApiError::rejected(400, e.to_string()))?;
        let eth = (wei / Decimal::from(1_000_000_000_000_000_000u64)).normalize();

        let mut ledger = self.ledger();
        ledger.balance -= eth;
        let hash = format!("0x{:02x}", ledger.transactions.len() + 1);
        ledger.transactions.push(Transaction {
            hash: hash.clone(),
            from: ALICE_ADDRESS.into(),
            to: request.to.clone(),
            value_eth: eth.to_string(),
            timestamp: 2000,
            direction: Direction::Outgoing,
        });

        Ok(TransferAck {
            tx_hash: Some(hash),
            ..TransferAck::default()
        })
    }
}

fn client(api: &Arc<FakeWalletApi>) -> Arc<WalletClient> {
    Arc::new(WalletClient::with_interval(api.clone(), POLL, None))
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_login_resolves_address_from_history() {
    let api = FakeWalletApi::new();
    let client = client(&api);

    let identity = client.login("alice", "secret").await.unwrap();

    assert_eq!(identity, Identity::new("alice", "a@x.com"));
    let snapshot = client.snapshot();
    assert_eq!(snapshot.balance, "1.5000");
    assert_eq!(snapshot.address, WalletAddress::Known(ALICE_ADDRESS.into()));
    assert!(!snapshot.transactions_loading);
    assert!(client.is_polling());
}

#[tokio::test]
async fn test_login_failure_surfaces_service_message() {
    let api = FakeWalletApi::new();
    let client = client(&api);

    let err = client.login("alice", "wrong").await.unwrap_err();

    match err {
        Error::Auth(message) => assert_eq!(message, "Invalid username or password"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!client.is_signed_in());
    assert_eq!(client.snapshot().balance, "0.00");
}

#[tokio::test]
async fn test_initial_refresh_failure_is_login_error() {
    let api = FakeWalletApi::new();
    api.ledger().fail_history = true;
    let client = client(&api);

    let err = client.login("alice", "secret").await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert!(!client.is_signed_in());
    assert!(!client.is_polling());
}

#[tokio::test]
async fn test_register_then_login() {
    let api = FakeWalletApi::new();
    let client = client(&api);

    client.register("carol", "c@x.com", "pw").await.unwrap();
    assert!(client.is_signed_in());

    let err = client.register("alice", "other@x.com", "pw").await.unwrap_err();
    assert!(matches!(err, Error::Registration(_)));
    // The earlier session survives a failed registration
    assert!(client.is_signed_in());
}

#[tokio::test]
async fn test_logout_discards_in_flight_refresh() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();

    let gate = api.gate_next_balance();
    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.refresh_now().await })
    };
    api.balance_entered.notified().await;

    client.logout();
    assert!(!client.is_polling());
    gate.notify_one();

    let report = pending.await.unwrap().unwrap();
    assert!(report.discarded);

    let snapshot = client.snapshot();
    assert_eq!(snapshot.balance, "0.00");
    assert_eq!(snapshot.address, WalletAddress::Unknown);
    assert!(snapshot.transactions.is_empty());
    assert!(client.identity().is_none());
}

#[tokio::test]
async fn test_relogin_ignores_previous_session_results() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();
    let first = client.session_id();

    let gate = api.gate_next_balance();
    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.refresh_now().await })
    };
    api.balance_entered.notified().await;

    client.login("alice", "secret").await.unwrap();
    assert_ne!(client.session_id(), first);

    // The held request answers with a value the new session never saw
    api.ledger().balance = Decimal::from_str("7.7").unwrap();
    gate.notify_one();
    let report = pending.await.unwrap().unwrap();

    assert!(report.discarded);
    assert_eq!(client.snapshot().balance, "1.5000");
}

// =============================================================================
// Transfers
// =============================================================================

#[tokio::test]
async fn test_send_rejects_malformed_address_without_network() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();
    let before = api.calls();

    let malformed = format!("0x{}", "Z".repeat(40));
    let err = client.send(&malformed, "1.0").await.unwrap_err();

    assert!(matches!(err, Error::Validation(ValidationError::Format)));
    assert_eq!(api.calls(), before);
}

#[tokio::test]
async fn test_send_insufficient_funds() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();

    let err = client.send(BOB_ADDRESS, "2.0").await.unwrap_err();

    assert!(matches!(err, Error::Validation(ValidationError::InsufficientFunds)));
    assert_eq!(api.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_send_while_signed_out() {
    let api = FakeWalletApi::new();
    let client = client(&api);

    let err = client.send(BOB_ADDRESS, "0.1").await.unwrap_err();

    assert!(matches!(err, Error::Validation(ValidationError::Unauthenticated)));
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn test_send_refreshes_balance_and_history() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();

    let receipt = client.send(BOB_ADDRESS, "0.25").await.unwrap();
    assert_eq!(receipt.value_wei, 250_000_000_000_000_000);

    // Visible without waiting for a poll
    let snapshot = client.snapshot();
    assert_eq!(snapshot.balance, "1.2500");
    assert!(snapshot
        .transactions
        .iter()
        .any(|t| t.to == BOB_ADDRESS && t.value_eth == "0.25"));
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_polling_cadence_and_stop_on_logout() {
    let api = FakeWalletApi::new();
    let client = client(&api);

    client.login("alice", "secret").await.unwrap();
    assert_eq!(api.balance_calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(api.balance_calls.load(Ordering::SeqCst), 3);

    client.logout();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.balance_calls.load(Ordering::SeqCst), 3);
}

fn incoming(hash: &str, value: &str) -> Transaction {
    Transaction {
        hash: hash.into(),
        from: BOB_ADDRESS.into(),
        to: ALICE_ADDRESS.into(),
        value_eth: value.into(),
        timestamp: 3000,
        direction: Direction::Incoming,
    }
}

#[tokio::test(start_paused = true)]
async fn test_history_failure_while_polling_keeps_previous_history() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();

    {
        let mut ledger = api.ledger();
        ledger.balance = Decimal::from_str("2.0000").unwrap();
        ledger.transactions.push(incoming("0xbb", "0.5"));
        ledger.fail_history = true;
    }
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.balance, "2.0000");
    let hashes: Vec<_> = snapshot.transactions.iter().map(|t| t.hash.as_str()).collect();
    assert_eq!(hashes, vec!["0xaa"]);
    assert!(!snapshot.transactions_loading);
    assert!(client.is_signed_in());
    assert!(client.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_balance_failure_while_polling_keeps_previous_balance() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();

    {
        let mut ledger = api.ledger();
        ledger.balance = Decimal::from_str("9.0000").unwrap();
        ledger.transactions.push(incoming("0xbb", "7.5"));
        ledger.fail_balance = true;
    }
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.balance, "1.5000");
    assert_eq!(snapshot.transactions.len(), 2);
    assert_eq!(snapshot.address, WalletAddress::Known(ALICE_ADDRESS.into()));
    assert!(client.is_signed_in());
    assert!(client.is_polling());

    // Service recovers; the next tick picks the balance up again
    api.ledger().fail_balance = false;
    tokio::time::sleep(POLL).await;
    assert_eq!(client.snapshot().balance, "9.0000");
}

#[tokio::test(start_paused = true)]
async fn test_relogin_keeps_a_single_timer() {
    let api = FakeWalletApi::new();
    let client = client(&api);

    client.login("alice", "secret").await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    client.login("alice", "secret").await.unwrap();
    assert_eq!(api.balance_calls.load(Ordering::SeqCst), 2);

    // One tick per period from the second login only
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(api.balance_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_polling_picks_up_external_changes() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();
    let mut cycles = client.subscribe();

    api.ledger().balance = Decimal::from_str("3.0").unwrap();
    cycles.changed().await.unwrap();

    assert_eq!(client.snapshot().balance, "3.0");
    assert!(!client.snapshot().transactions_loading);
}

// =============================================================================
// History views
// =============================================================================

#[tokio::test]
async fn test_history_view_does_not_reorder_snapshot() {
    let api = FakeWalletApi::new();
    {
        let mut ledger = api.ledger();
        ledger.transactions.push(Transaction {
            hash: "0xbb".into(),
            from: BOB_ADDRESS.into(),
            to: ALICE_ADDRESS.into(),
            value_eth: "3".into(),
            timestamp: 3000,
            direction: Direction::Incoming,
        });
    }
    let client = client(&api);
    client.login("alice", "secret").await.unwrap();

    let incoming = client.history(HistoryFilter::Incoming, HistorySort::Newest);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].hash, "0xbb");

    let newest: Vec<_> = client
        .history(HistoryFilter::All, HistorySort::Newest)
        .into_iter()
        .map(|t| t.hash)
        .collect();
    assert_eq!(newest, vec!["0xbb", "0xaa"]);

    let stored: Vec<_> = client.snapshot().transactions.into_iter().map(|t| t.hash).collect();
    assert_eq!(stored, vec!["0xaa", "0xbb"]);
}

#[tokio::test]
async fn test_history_empty_when_signed_out() {
    let api = FakeWalletApi::new();
    let client = client(&api);
    assert!(client.history(HistoryFilter::All, HistorySort::Newest).is_empty());
}
