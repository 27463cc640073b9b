//! Remote wallet service port
//!
//! Defines the request/response contract of the custodial wallet service.
//! The session, refresh and transfer services use this trait without
//! knowing how requests travel (HTTP, in-memory fakes in tests, etc.)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Identity, Transaction};

/// Failure talking to the remote service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-success response. `message` is the service's own `error` text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Timeout, refused connection, or any other transport failure
    #[error("{0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Outgoing transfer as submitted to the service
///
/// Numeric fields are decimal strings in the smallest unit (wei).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub to: String,
    pub value: String,
    pub gas: String,
    #[serde(rename = "gasPrice")]
    pub gas_price: String,
    pub broadcast: bool,
}

/// Acknowledgement returned for a submitted transfer.
///
/// The service's reply shape is loose; whatever is present is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAck {
    #[serde(default, alias = "hash", alias = "transaction_hash")]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub signed_tx: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Custodial wallet service
///
/// Every call except `register` and `login` needs the bearer token of the
/// current session.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Create an account. Success carries no credentials.
    async fn register(&self, username: &str, email: &str, password: &str) -> ApiResult<()>;

    /// Exchange credentials for an access token
    async fn login(&self, username: &str, password: &str) -> ApiResult<String>;

    /// Username and email of the token's owner
    async fn profile(&self, token: &str) -> ApiResult<Identity>;

    /// Balance as the literal decimal string the service reports
    async fn balance(&self, token: &str) -> ApiResult<String>;

    /// The user's own address, if the service exposes it
    async fn wallet_address(&self, token: &str) -> ApiResult<Option<String>>;

    /// Transfer history in the service's order
    async fn transaction_history(&self, token: &str) -> ApiResult<Vec<Transaction>>;

    /// Sign and broadcast a transfer
    async fn submit_transfer(&self, token: &str, request: &TransferRequest) -> ApiResult<TransferAck>;
}
