//! Transfer coordinator - validate, submit, then refresh
//!
//! Validation runs locally against the last known balance and never touches
//! the network. After the service accepts a transfer, one visible refresh
//! runs before `send` returns so the caller sees the new balance together
//! with the confirmation.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::is_valid_address;
use crate::domain::result::{Error, Result, ValidationError};
use crate::ports::{TransferAck, TransferRequest, WalletApi};
use crate::services::logging::{record, LogEvent, LoggingService};
use crate::services::refresh::{lock_state, RefreshMode, RefreshReport, SharedState, SnapshotRefresher};

/// 5 gwei
pub const GAS_PRICE_WEI: u64 = 5_000_000_000;
/// Plain value transfer
pub const GAS_LIMIT: u64 = 21_000;
/// 1 ETH = 10^18 wei
pub const WEI_DECIMALS: u32 = 18;

/// A transfer the service accepted
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub to: String,
    pub amount_eth: Decimal,
    /// Amount actually submitted, in wei
    pub value_wei: u128,
    pub ack: TransferAck,
    /// Outcome of the refresh that ran right after submission
    pub refresh: RefreshReport,
}

/// Convert ETH to wei, truncating anything below one wei.
/// `None` for negative amounts or on overflow.
pub fn to_wei(amount_eth: Decimal) -> Option<u128> {
    let truncated = amount_eth.round_dp_with_strategy(WEI_DECIMALS, RoundingStrategy::ToZero);
    let mantissa = u128::try_from(truncated.mantissa()).ok()?;
    mantissa.checked_mul(10u128.checked_pow(WEI_DECIMALS - truncated.scale())?)
}

/// Check a transfer against the last known balance.
///
/// Checks run in order and stop at the first failure: address format,
/// amount, funds. An amount that rounds down to zero wei counts as not
/// positive. A balance that is not a decimal (`None`) covers nothing.
pub fn validate(
    to: &str,
    amount: &str,
    available: Option<Decimal>,
) -> std::result::Result<(Decimal, u128), ValidationError> {
    if !is_valid_address(to) {
        return Err(ValidationError::Format);
    }

    let amount_eth = Decimal::from_str(amount.trim())
        .ok()
        .filter(|a| a.is_sign_positive() && !a.is_zero())
        .ok_or(ValidationError::Amount)?;

    let value_wei = match to_wei(amount_eth) {
        Some(0) => return Err(ValidationError::Amount),
        Some(wei) => Some(wei),
        None => None,
    };

    if !available.is_some_and(|b| amount_eth <= b) {
        return Err(ValidationError::InsufficientFunds);
    }

    // Only unrepresentable amounts get here without a wei value
    let value_wei = value_wei.ok_or(ValidationError::Amount)?;
    Ok((amount_eth, value_wei))
}

pub struct TransferCoordinator {
    api: Arc<dyn WalletApi>,
    state: SharedState,
    refresher: Arc<SnapshotRefresher>,
    logger: Option<Arc<LoggingService>>,
}

impl TransferCoordinator {
    pub fn new(
        api: Arc<dyn WalletApi>,
        state: SharedState,
        refresher: Arc<SnapshotRefresher>,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        Self {
            api,
            state,
            refresher,
            logger,
        }
    }

    /// Send `amount` ETH to `to` from the signed-in wallet
    pub async fn send(&self, to: &str, amount: &str) -> Result<TransferReceipt> {
        let (session, available) = {
            let state = lock_state(&self.state);
            match (state.session(), state.snapshot()) {
                (Some(session), Some(snapshot)) => (session.clone(), snapshot.balance_decimal()),
                _ => return Err(self.rejected(ValidationError::Unauthenticated)),
            }
        };

        let (amount_eth, value_wei) = validate(to, amount, available).map_err(|e| self.rejected(e))?;

        let request = TransferRequest {
            to: to.to_string(),
            value: value_wei.to_string(),
            gas: GAS_LIMIT.to_string(),
            gas_price: GAS_PRICE_WEI.to_string(),
            broadcast: true,
        };

        let ack = match self.api.submit_transfer(session.token(), &request).await {
            Ok(ack) => ack,
            Err(e) => {
                let message = e.to_string();
                record(
                    &self.logger,
                    LogEvent::new("transfer_rejected")
                        .with_endpoint("sign_transaction")
                        .with_error(message.clone()),
                );
                return Err(Error::submission(message));
            }
        };

        record(&self.logger, LogEvent::new("transfer_submitted").with_endpoint("sign_transaction"));

        // Failures here are logged by the refresher; the transfer itself stands
        let refresh = self.refresher.refresh(&session, RefreshMode::Visible).await;

        Ok(TransferReceipt {
            to: request.to,
            amount_eth,
            value_wei,
            ack,
            refresh,
        })
    }

    fn rejected(&self, error: ValidationError) -> Error {
        record(
            &self.logger,
            LogEvent::new("transfer_rejected").with_error(error.to_string()),
        );
        Error::Validation(error)
    }
}
