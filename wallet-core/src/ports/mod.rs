//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod wallet_api;

pub use wallet_api::{ApiError, ApiResult, TransferAck, TransferRequest, WalletApi};
