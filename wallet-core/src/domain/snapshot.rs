//! Wallet snapshot domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Transaction, WalletAddress};

/// Balance shown before the first successful fetch and after logout
pub const DEFAULT_BALANCE: &str = "0.00";

/// Locally cached view of balance, address and history for one session.
///
/// `balance` is always the literal last reported by the remote service; no
/// arithmetic is ever performed on it locally. `transactions` keeps the
/// order of the latest fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub balance: String,
    pub address: WalletAddress,
    pub transactions: Vec<Transaction>,
    pub transactions_loading: bool,
}

impl Default for WalletSnapshot {
    fn default() -> Self {
        Self {
            balance: DEFAULT_BALANCE.to_string(),
            address: WalletAddress::Unknown,
            transactions: Vec::new(),
            transactions_loading: false,
        }
    }
}

impl WalletSnapshot {
    /// Balance parsed for comparisons. `None` if the literal is not a decimal.
    pub fn balance_decimal(&self) -> Option<Decimal> {
        self.balance.trim().parse::<Decimal>().ok()
    }
}
