//! Wallet address model

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Total length of a hex address including the `0x` prefix
pub const ADDRESS_LEN: usize = 42;

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap())
}

/// Check that `candidate` is a `0x`-prefixed, 42 character hex address
pub fn is_valid_address(candidate: &str) -> bool {
    candidate.len() == ADDRESS_LEN && address_pattern().is_match(candidate)
}

/// The user's own address as far as this session knows it.
///
/// Resolution is a one-time fill-in: once `Known`, the value is never
/// replaced for the remainder of the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "address", rename_all = "lowercase")]
pub enum WalletAddress {
    #[default]
    Unknown,
    Known(String),
}

impl WalletAddress {
    pub fn is_known(&self) -> bool {
        matches!(self, WalletAddress::Known(_))
    }

    pub fn as_known(&self) -> Option<&str> {
        match self {
            WalletAddress::Known(address) => Some(address),
            WalletAddress::Unknown => None,
        }
    }

    /// Fill in the address if it is still unknown.
    ///
    /// Returns true if the value was written. Empty candidates are ignored.
    pub fn fill(&mut self, candidate: impl Into<String>) -> bool {
        let candidate = candidate.into();
        if self.is_known() || candidate.trim().is_empty() {
            return false;
        }
        *self = WalletAddress::Known(candidate);
        true
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletAddress::Known(address) => f.write_str(address),
            WalletAddress::Unknown => f.write_str("unknown"),
        }
    }
}
