//! Wallet address inference from transfer history
//!
//! The service does not always expose the user's own address. It can be
//! recovered from history: the sender of any outgoing transfer is the user,
//! and so is the recipient of any incoming one.

use crate::domain::{Direction, Transaction};

/// Infer the user's address from `transactions`.
///
/// Outgoing transfers take precedence over incoming ones; within each
/// direction the first match in fetched order wins. Callers that already
/// know the address must not call this.
pub fn resolve_address(transactions: &[Transaction]) -> Option<String> {
    transactions
        .iter()
        .find(|tx| tx.direction == Direction::Outgoing)
        .map(|tx| tx.from.clone())
        .or_else(|| {
            transactions
                .iter()
                .find(|tx| tx.direction == Direction::Incoming)
                .map(|tx| tx.to.clone())
        })
}
