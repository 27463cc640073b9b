//! Status command - show profile, balance and wallet address

use anyhow::Result;
use colored::Colorize;
use wallet_core::OperationResult;

use super::{get_context, sign_in, AuthArgs};
use crate::output;

pub async fn run(auth: AuthArgs, json: bool) -> Result<()> {
    let ctx = get_context("status")?;
    let identity = sign_in(&ctx, auth, json).await?;

    let snapshot = ctx.client.snapshot();
    ctx.client.logout();

    if json {
        let result = OperationResult::ok(&snapshot)
            .with_context("identity", serde_json::to_value(&identity)?);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", format!("Wallet of {} <{}>", identity.username, identity.email).bold());
    println!();
    println!("{}", output::snapshot_table(&snapshot));

    Ok(())
}
