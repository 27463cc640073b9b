//! History view - filter and order a transaction set for display
//!
//! Views are derived on demand and never written back to the snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Transaction;

/// Which transactions to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Incoming,
    Outgoing,
}

/// How to order the kept transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySort {
    /// Timestamp descending
    #[default]
    Newest,
    /// Timestamp ascending
    Oldest,
    /// Value descending
    Highest,
    /// Value ascending
    Lowest,
}

impl HistoryFilter {
    fn keeps(&self, tx: &Transaction) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Incoming => tx.is_incoming(),
            HistoryFilter::Outgoing => tx.is_outgoing(),
        }
    }
}

impl FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(HistoryFilter::All),
            "incoming" | "in" => Ok(HistoryFilter::Incoming),
            "outgoing" | "out" => Ok(HistoryFilter::Outgoing),
            other => Err(format!(
                "unknown filter '{}' (expected all, incoming or outgoing)",
                other
            )),
        }
    }
}

impl fmt::Display for HistoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryFilter::All => "all",
            HistoryFilter::Incoming => "incoming",
            HistoryFilter::Outgoing => "outgoing",
        })
    }
}

impl FromStr for HistorySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(HistorySort::Newest),
            "oldest" => Ok(HistorySort::Oldest),
            "highest" => Ok(HistorySort::Highest),
            "lowest" => Ok(HistorySort::Lowest),
            other => Err(format!(
                "unknown sort '{}' (expected newest, oldest, highest or lowest)",
                other
            )),
        }
    }
}

impl fmt::Display for HistorySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistorySort::Newest => "newest",
            HistorySort::Oldest => "oldest",
            HistorySort::Highest => "highest",
            HistorySort::Lowest => "lowest",
        })
    }
}

/// Filter and sort `transactions` without touching the input.
///
/// The sort is stable, so ties keep their fetched order. Values that do not
/// parse as decimals sort as zero.
pub fn view(transactions: &[Transaction], filter: HistoryFilter, sort: HistorySort) -> Vec<&Transaction> {
    let mut kept: Vec<&Transaction> = transactions.iter().filter(|tx| filter.keeps(tx)).collect();

    match sort {
        HistorySort::Newest => kept.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        HistorySort::Oldest => kept.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        HistorySort::Highest => kept.sort_by(|a, b| b.value().cmp(&a.value())),
        HistorySort::Lowest => kept.sort_by(|a, b| a.value().cmp(&b.value())),
    }

    kept
}
