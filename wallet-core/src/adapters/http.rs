//! Wallet service HTTP client
//!
//! Talks JSON over HTTP to the custodial wallet service. Non-success
//! responses carry `{"error": "..."}`; that text is surfaced verbatim.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::domain::{Direction, Identity, Transaction};
use crate::ports::{ApiError, ApiResult, TransferAck, TransferRequest, WalletApi};

// =============================================================================
// API Response Models
// =============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    username: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(deserialize_with = "deserialize_literal")]
    balance: String,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    transactions: Vec<WireTransaction>,
}

/// Transaction as it appears on the wire
#[derive(Debug, Clone, Deserialize)]
struct WireTransaction {
    hash: String,
    from: String,
    to: String,
    #[serde(deserialize_with = "deserialize_literal")]
    value_eth: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: i64,
    direction: Direction,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct Registration<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Keep a decimal as the exact text sent, whether it came as a string or a number
fn deserialize_literal<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("expected number or string for decimal")),
    }
}

/// Unix seconds, sent either as an integer, a float, or a numeric string
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| D::Error::custom("timestamp out of range")),
        JsonValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| D::Error::custom(format!("invalid timestamp: {}", e))),
        _ => Err(D::Error::custom("expected number or string for timestamp")),
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of the wallet service port
#[derive(Debug, Clone)]
pub struct HttpWalletApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpWalletApi {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url).context("Invalid wallet service URL")?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Wallet service URL must use http or https");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> ApiResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        self.check_response_status(response, fallback).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str, fallback: &str) -> ApiResult<T> {
        let request = self.client.get(self.url(path)).bearer_auth(token);
        let response = self.send(request, fallback).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Transport(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            ApiError::Transport("Unable to connect to the wallet service".to_string())
        } else {
            ApiError::Transport(format!("Wallet service request failed: {}", error))
        }
    }

    /// Pass success through; turn anything else into `Rejected` with the
    /// service's own error text, or `fallback` if it sent none
    async fn check_response_status(&self, response: Response, fallback: &str) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        Err(ApiError::rejected(status.as_u16(), message))
    }

    fn map_transaction(wire: WireTransaction) -> Transaction {
        Transaction {
            hash: wire.hash,
            from: wire.from,
            to: wire.to,
            value_eth: wire.value_eth,
            timestamp: wire.timestamp,
            direction: wire.direction,
        }
    }
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn register(&self, username: &str, email: &str, password: &str) -> ApiResult<()> {
        let request = self.client.post(self.url("/register")).json(&Registration {
            username,
            email,
            password,
        });
        self.send(request, "Registration failed").await?;
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<String> {
        let request = self
            .client
            .post(self.url("/login"))
            .json(&Credentials { username, password });
        let response = self.send(request, "Login failed").await?;
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("/login: {}", e)))?;
        Ok(body.access_token)
    }

    async fn profile(&self, token: &str) -> ApiResult<Identity> {
        let body: ProfileResponse = self
            .get_json("/profile", token, "Failed to fetch profile")
            .await?;
        Ok(Identity::new(body.username, body.email))
    }

    async fn balance(&self, token: &str) -> ApiResult<String> {
        let body: BalanceResponse = self
            .get_json("/balance", token, "Failed to fetch balance")
            .await?;
        Ok(body.balance)
    }

    async fn wallet_address(&self, token: &str) -> ApiResult<Option<String>> {
        let body: AddressResponse = self
            .get_json("/wallet_address", token, "Failed to fetch wallet address")
            .await?;
        Ok(body.address.filter(|a| !a.trim().is_empty()))
    }

    async fn transaction_history(&self, token: &str) -> ApiResult<Vec<Transaction>> {
        let body: HistoryResponse = self
            .get_json("/transaction_history", token, "Failed to fetch transaction history")
            .await?;
        Ok(body.transactions.into_iter().map(Self::map_transaction).collect())
    }

    async fn submit_transfer(&self, token: &str, transfer: &TransferRequest) -> ApiResult<TransferAck> {
        let request = self
            .client
            .post(self.url("/sign_transaction"))
            .bearer_auth(token)
            .json(transfer);
        let response = self.send(request, "Transaction failed").await?;

        // The acknowledgement shape is loose; an unreadable body still means success
        let ack = response.json::<TransferAck>().await.unwrap_or_default();
        Ok(ack)
    }
}

// =============================================================================
// Tests
// =============================================================================
