//! Wallet CLI - custodial wallet in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use wallet_core::{HistoryFilter, HistorySort};

mod commands;
mod output;

use commands::{config, history, logs, register, send, status, watch, AuthArgs};

/// Wallet - view your balance, browse history and send transfers
#[derive(Parser)]
#[command(name = "wallet", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in to it
    Register {
        /// Username for the new account
        #[arg(long, short)]
        username: Option<String>,
        /// Email address for the new account
        #[arg(long, short)]
        email: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show profile, balance and wallet address
    Status {
        #[command(flatten)]
        auth: AuthArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions
    History {
        #[command(flatten)]
        auth: AuthArgs,
        /// Which transactions to show (all, incoming, outgoing)
        #[arg(long, short, default_value_t = HistoryFilter::All)]
        filter: HistoryFilter,
        /// Order (newest, oldest, highest, lowest)
        #[arg(long, short, default_value_t = HistorySort::Newest)]
        sort: HistorySort,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send ETH to another address
    Send {
        /// Recipient address (0x followed by 40 hex characters)
        to: String,
        /// Amount in ETH
        amount: String,
        #[command(flatten)]
        auth: AuthArgs,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stay signed in and print the wallet after every poll
    Watch {
        #[command(flatten)]
        auth: AuthArgs,
    },

    /// View and manage the client event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change client settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { username, email, json } => register::run(username, email, json).await,
        Commands::Status { auth, json } => status::run(auth, json).await,
        Commands::History { auth, filter, sort, json } => history::run(auth, filter, sort, json).await,
        Commands::Send { to, amount, auth, yes, json } => send::run(&to, &amount, auth, yes, json).await,
        Commands::Watch { auth } => watch::run(auth).await,
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}
