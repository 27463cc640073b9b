//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local precondition failures for an outgoing transfer.
///
/// These never reach the network and never mutate state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid Ethereum address format")]
    Format,

    #[error("Amount must be greater than 0")]
    Amount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Not authenticated")]
    Unauthenticated,
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Login rejected, or the initial post-login refresh failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The remote service rejected a well-formed transfer
    #[error("Transfer rejected: {0}")]
    Submission(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context value
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}
