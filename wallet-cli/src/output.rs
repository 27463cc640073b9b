//! Output formatting utilities

use std::time::Duration;

use chrono::{TimeZone, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use wallet_core::{Direction, Transaction, WalletSnapshot};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Spinner on stderr for a network wait. Hidden in JSON mode so stdout
/// stays machine-readable.
pub fn spinner(message: &str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub fn format_unix_ms(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Balance and address as key/value rows
pub fn snapshot_table(snapshot: &WalletSnapshot) -> Table {
    let mut table = create_table();
    table.add_row(vec!["Balance", &format!("{} ETH", snapshot.balance)]);
    table.add_row(vec![
        "Address",
        snapshot.address.as_known().unwrap_or("unknown"),
    ]);
    table.add_row(vec!["Transactions", &snapshot.transactions.len().to_string()]);
    table
}

pub fn transaction_table(transactions: &[Transaction]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Time", "Direction", "Amount (ETH)", "Counterparty", "Hash"]);

    for tx in transactions {
        let (direction, counterparty) = match tx.direction {
            Direction::Incoming => ("in".green().to_string(), tx.from.as_str()),
            Direction::Outgoing => ("out".red().to_string(), tx.to.as_str()),
        };
        table.add_row(vec![
            tx.time()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| tx.timestamp.to_string()),
            direction,
            tx.value_eth.clone(),
            counterparty.to_string(),
            tx.hash.clone(),
        ]);
    }

    table
}
