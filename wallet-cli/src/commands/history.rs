//! History command - list transactions with filter and sort

use anyhow::Result;
use colored::Colorize;
use wallet_core::{HistoryFilter, HistorySort, OperationResult};

use super::{get_context, sign_in, AuthArgs};
use crate::output;

pub async fn run(auth: AuthArgs, filter: HistoryFilter, sort: HistorySort, json: bool) -> Result<()> {
    let ctx = get_context("history")?;
    sign_in(&ctx, auth, json).await?;

    let transactions = ctx.client.history(filter, sort);
    ctx.client.logout();

    if json {
        let result = OperationResult::ok(&transactions)
            .with_context("filter", serde_json::to_value(filter)?)
            .with_context("sort", serde_json::to_value(sort)?);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("{}", format!("No {} transactions.", filter).dimmed());
        return Ok(());
    }

    println!("{}", output::transaction_table(&transactions));
    println!(
        "{}",
        format!("{} transaction(s), {} first", transactions.len(), sort).dimmed()
    );

    Ok(())
}
