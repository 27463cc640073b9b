//! Mock wallet service for testing
//!
//! A small HTTP server that speaks the same JSON as the real wallet service,
//! so the HTTP adapter can be exercised without a backend:
//! - POST /register, POST /login
//! - GET /profile, /balance, /wallet_address, /transaction_history
//! - POST /sign_transaction (debits the balance and appends to history)

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

pub const MOCK_USERNAME: &str = "alice";
pub const MOCK_PASSWORD: &str = "secret";
pub const MOCK_TOKEN: &str = "mock_token";
pub const MOCK_ADDRESS: &str = "0x1111111111111111111111111111111111111111";

/// Mock wallet server
pub struct MockWalletServer {
    port: u16,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Behaviour switches for the mock
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Starting balance in ETH
    pub balance: Decimal,
    /// Whether /wallet_address returns an address
    pub expose_address: bool,
    /// Reject every transfer with this message
    pub reject_transfers: Option<String>,
    /// Answer /balance with a bare 500 and no error body
    pub fail_balance: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            balance: Decimal::new(15000, 4),
            expose_address: true,
            reject_transfers: None,
            fail_balance: false,
            delay_ms: 0,
        }
    }
}

struct MockLedger {
    config: MockConfig,
    balance: Decimal,
    transactions: Vec<JsonValue>,
    users: Vec<(String, String)>,
}

impl MockWalletServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        // Non-blocking so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        let ledger = Arc::new(Mutex::new(MockLedger {
            balance: config.balance,
            config,
            transactions: vec![json!({
                "hash": "0xaa",
                "from": MOCK_ADDRESS,
                "to": "0x2222222222222222222222222222222222222222",
                "value_eth": "0.5",
                "timestamp": 1000,
                "direction": "outgoing"
            })],
            users: vec![(MOCK_USERNAME.to_string(), MOCK_PASSWORD.to_string())],
        }));

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let ledger = ledger.clone();
                        thread::spawn(move || handle_connection(stream, &ledger));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockWalletServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one request: headers, then exactly Content-Length bytes of body
fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    stream.set_nonblocking(false).ok()?;
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body = String::from_utf8_lossy(&data[header_end..]).to_string();
    Some((head, body))
}

fn handle_connection(mut stream: TcpStream, ledger: &Mutex<MockLedger>) {
    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };

    let delay_ms = ledger.lock().map(|l| l.config.delay_ms).unwrap_or(0);
    if delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(delay_ms));
    }

    let first_line = head.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    }
    let (method, path) = (parts[0], parts[1].split('?').next().unwrap_or(parts[1]));

    let authorized = head
        .to_lowercase()
        .contains(&format!("authorization: bearer {}", MOCK_TOKEN));
    let payload: JsonValue = serde_json::from_str(&body).unwrap_or(JsonValue::Null);
    let mut ledger = match ledger.lock() {
        Ok(guard) => guard,
        Err(_) => return,
    };

    let (status, text, response) = match (method, path) {
        ("POST", "/register") => register(&mut ledger, &payload),
        ("POST", "/login") => login(&ledger, &payload),
        (_, "/profile" | "/balance" | "/wallet_address" | "/transaction_history" | "/sign_transaction")
            if !authorized =>
        {
            (401, "Unauthorized", json!({"error": "Missing or invalid token"}))
        }
        ("GET", "/profile") => (
            200,
            "OK",
            json!({"username": MOCK_USERNAME, "email": "a@x.com"}),
        ),
        ("GET", "/balance") if ledger.config.fail_balance => {
            send_response(&mut stream, 500, "Internal Server Error", "");
            return;
        }
        ("GET", "/balance") => (200, "OK", json!({"balance": ledger.balance.to_string()})),
        ("GET", "/wallet_address") if ledger.config.expose_address => {
            (200, "OK", json!({"address": MOCK_ADDRESS}))
        }
        ("GET", "/wallet_address") => (200, "OK", json!({})),
        ("GET", "/transaction_history") => {
            (200, "OK", json!({"transactions": ledger.transactions.clone()}))
        }
        ("POST", "/sign_transaction") => sign_transaction(&mut ledger, &payload),
        _ => (404, "Not Found", json!({"error": "Endpoint not found"})),
    };

    send_response(&mut stream, status, text, &response.to_string());
}

fn register(ledger: &mut MockLedger, payload: &JsonValue) -> (u16, &'static str, JsonValue) {
    let field = |name: &str| payload.get(name).and_then(|v| v.as_str()).unwrap_or("");
    let (username, email, password) = (field("username"), field("email"), field("password"));

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return (400, "Bad Request", json!({"error": "Username, email and password are required"}));
    }
    if ledger.users.iter().any(|(u, _)| u == username) {
        return (
            409,
            "Conflict",
            json!({"error": "User with that username or email already exists"}),
        );
    }
    ledger.users.push((username.to_string(), password.to_string()));
    (201, "Created", json!({"message": "User registered successfully"}))
}

fn login(ledger: &MockLedger, payload: &JsonValue) -> (u16, &'static str, JsonValue) {
    let field = |name: &str| payload.get(name).and_then(|v| v.as_str()).unwrap_or("");
    let (username, password) = (field("username"), field("password"));

    if ledger.users.iter().any(|(u, p)| u == username && p == password) {
        (200, "OK", json!({"access_token": MOCK_TOKEN}))
    } else {
        (401, "Unauthorized", json!({"error": "Invalid username or password"}))
    }
}

fn sign_transaction(ledger: &mut MockLedger, payload: &JsonValue) -> (u16, &'static str, JsonValue) {
    if let Some(message) = &ledger.config.reject_transfers {
        return (400, "Bad Request", json!({"error": message}));
    }

    let to = payload.get("to").and_then(|v| v.as_str()).unwrap_or("").to_string();
    let wei = payload
        .get("value")
        .and_then(|v| v.as_str())
        .and_then(|v| v.parse::<Decimal>().ok());
    let Some(wei) = wei else {
        return (400, "Bad Request", json!({"error": "Missing transaction parameters"}));
    };

    let eth = (wei / Decimal::from(1_000_000_000_000_000_000u64)).normalize();
    ledger.balance -= eth;
    let sequence = ledger.transactions.len() + 1;
    let hash = format!("0x{:064x}", sequence);
    ledger.transactions.push(json!({
        "hash": hash,
        "from": MOCK_ADDRESS,
        "to": to,
        "value_eth": eth.to_string(),
        "timestamp": 2000 + sequence as i64,
        "direction": "outgoing"
    }));

    (200, "OK", json!({"tx_hash": hash}))
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::{HttpWalletApi, DEFAULT_TIMEOUT};
    use crate::ports::{ApiError, TransferRequest, WalletApi};
    use std::time::Duration;

    fn client(server: &MockWalletServer) -> HttpWalletApi {
        HttpWalletApi::new(&server.base_url(), DEFAULT_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn test_login_and_fetch_snapshot_fields() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let token = api.login(MOCK_USERNAME, MOCK_PASSWORD).await.unwrap();
        assert_eq!(token, MOCK_TOKEN);

        let identity = api.profile(&token).await.unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, "a@x.com");

        assert_eq!(api.balance(&token).await.unwrap(), "1.5000");
        assert_eq!(
            api.wallet_address(&token).await.unwrap(),
            Some(MOCK_ADDRESS.to_string())
        );

        let history = api.transaction_history(&token).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].hash, "0xaa");
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_service_message() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let err = api.login(MOCK_USERNAME, "wrong").await.unwrap_err();
        assert_eq!(err, ApiError::rejected(401, "Invalid username or password"));
        assert_eq!(err.to_string(), "Invalid username or password");
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        api.register("bob", "b@x.com", "pw").await.unwrap();
        let err = api.register("bob", "b@x.com", "pw").await.unwrap_err();
        assert!(err.to_string().contains("already exists"));

        // The new account can log in
        assert!(api.login("bob", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_error_body_uses_fallback() {
        let server = MockWalletServer::start(MockConfig {
            fail_balance: true,
            ..Default::default()
        })
        .unwrap();
        let api = client(&server);

        let err = api.balance(MOCK_TOKEN).await.unwrap_err();
        assert_eq!(err, ApiError::rejected(500, "Failed to fetch balance"));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockWalletServer::start(MockConfig {
            delay_ms: 1_000,
            ..Default::default()
        })
        .unwrap();
        let api = HttpWalletApi::new(&server.base_url(), Duration::from_millis(100)).unwrap();

        let err = api.balance(MOCK_TOKEN).await.unwrap_err();
        match err {
            ApiError::Transport(message) => assert!(message.contains("timed out"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_token() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let err = api.profile("bogus").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_missing_address_is_none() {
        let server = MockWalletServer::start(MockConfig {
            expose_address: false,
            ..Default::default()
        })
        .unwrap();
        let api = client(&server);

        assert_eq!(api.wallet_address(MOCK_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transfer_debits_balance() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let api = client(&server);

        let request = TransferRequest {
            to: "0x3333333333333333333333333333333333333333".into(),
            value: "500000000000000000".into(),
            gas: "21000".into(),
            gas_price: "5000000000".into(),
            broadcast: true,
        };
        let ack = api.submit_transfer(MOCK_TOKEN, &request).await.unwrap();
        assert!(ack.tx_hash.is_some());

        assert_eq!(api.balance(MOCK_TOKEN).await.unwrap(), "1.0000");
        let history = api.transaction_history(MOCK_TOKEN).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].to, request.to);
        assert_eq!(history[1].value_eth, "0.5");
    }

    #[tokio::test]
    async fn test_transfer_rejection_message() {
        let server = MockWalletServer::start(MockConfig {
            reject_transfers: Some("insufficient funds for gas".to_string()),
            ..Default::default()
        })
        .unwrap();
        let api = client(&server);

        let request = TransferRequest {
            to: "0x3333333333333333333333333333333333333333".into(),
            value: "1".into(),
            gas: "21000".into(),
            gas_price: "5000000000".into(),
            broadcast: true,
        };
        let err = api.submit_transfer(MOCK_TOKEN, &request).await.unwrap_err();
        assert_eq!(err.to_string(), "insufficient funds for gas");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let mut server = MockWalletServer::start(MockConfig::default()).unwrap();
        let url = server.base_url();
        server.stop();
        drop(server);

        let api = HttpWalletApi::new(&url, std::time::Duration::from_secs(2)).unwrap();
        let err = api.balance(MOCK_TOKEN).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
