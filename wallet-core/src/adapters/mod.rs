//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the WalletApi port
//! - In-process mock wallet service for testing

pub mod http;

#[cfg(test)]
pub mod mock_server;
