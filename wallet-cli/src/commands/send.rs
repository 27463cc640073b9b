//! Send command - validate, confirm and submit a transfer

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use wallet_core::services::{GAS_LIMIT, GAS_PRICE_WEI};
use wallet_core::OperationResult;

use super::{get_context, sign_in, AuthArgs};
use crate::output;

pub async fn run(to: &str, amount: &str, auth: AuthArgs, yes: bool, json: bool) -> Result<()> {
    let ctx = get_context("send")?;
    sign_in(&ctx, auth, json).await?;

    let result = submit(&ctx, to, amount, yes, json).await;
    ctx.client.logout();
    result
}

async fn submit(ctx: &wallet_core::WalletContext, to: &str, amount: &str, yes: bool, json: bool) -> Result<()> {
    let balance = ctx.client.snapshot().balance;

    if !yes && !json {
        println!();
        println!("  To:        {}", to);
        println!("  Amount:    {} ETH", amount);
        println!("  Balance:   {} ETH", balance);
        println!(
            "  {}",
            format!("Gas: {} at {} gwei", GAS_LIMIT, GAS_PRICE_WEI / 1_000_000_000).dimmed()
        );
        println!();

        if atty::isnt(atty::Stream::Stdin) {
            anyhow::bail!("Refusing to send without confirmation. Pass --yes");
        }
        if !Confirm::new()
            .with_prompt("Send this transfer?")
            .default(false)
            .interact()?
        {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    let spinner = output::spinner("Submitting transfer...", json);
    let result = ctx.client.send(to, amount).await;
    spinner.finish_and_clear();
    let receipt = result?;

    if json {
        let result = OperationResult::ok(&receipt)
            .with_context("balance", serde_json::Value::String(ctx.client.snapshot().balance));
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::success(&format!("Sent {} ETH to {}", receipt.amount_eth, receipt.to));
    if let Some(hash) = &receipt.ack.tx_hash {
        println!("  Transaction: {}", hash);
    }
    if !receipt.refresh.failures.is_empty() {
        output::warning("Transfer accepted, but the wallet could not be fully refreshed");
    }
    println!("  New balance: {} ETH", ctx.client.snapshot().balance);

    Ok(())
}
