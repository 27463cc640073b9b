//! Config command - show or change settings.json

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use wallet_core::adapters::http::HttpWalletApi;
use wallet_core::config::Config;

use super::get_wallet_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings, environment overrides included
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change stored settings
    Set {
        /// Base URL of the wallet service
        #[arg(long)]
        api_url: Option<String>,
        /// Seconds between background refreshes
        #[arg(long)]
        poll_interval: Option<u64>,
        /// Request timeout in seconds
        #[arg(long)]
        request_timeout: Option<u64>,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let wallet_dir = get_wallet_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&wallet_dir)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "api_url": config.api_url,
                        "poll_interval_secs": config.poll_interval.as_secs(),
                        "request_timeout_secs": config.request_timeout.as_secs(),
                        "wallet_dir": wallet_dir.to_string_lossy(),
                    })
                );
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["Service", &config.api_url]);
            table.add_row(vec!["Poll interval", &format!("{}s", config.poll_interval.as_secs())]);
            table.add_row(vec!["Request timeout", &format!("{}s", config.request_timeout.as_secs())]);
            table.add_row(vec!["Directory", &wallet_dir.display().to_string()]);
            println!("{}", table);
        }
        ConfigCommands::Set {
            api_url,
            poll_interval,
            request_timeout,
        } => {
            if api_url.is_none() && poll_interval.is_none() && request_timeout.is_none() {
                println!("{}", "Nothing to change".dimmed());
                return Ok(());
            }

            // Stored values only, so environment overrides are not persisted
            let mut config = Config::load_with(&wallet_dir, |_| None)?;
            if let Some(url) = api_url {
                // Validates scheme and syntax
                HttpWalletApi::new(&url, config.request_timeout)?;
                config.api_url = url;
            }
            if let Some(secs) = poll_interval {
                if secs == 0 {
                    anyhow::bail!("Poll interval must be at least 1 second");
                }
                config.poll_interval = Duration::from_secs(secs);
            }
            if let Some(secs) = request_timeout {
                if secs == 0 {
                    anyhow::bail!("Request timeout must be at least 1 second");
                }
                config.request_timeout = Duration::from_secs(secs);
            }

            config.save(&wallet_dir)?;
            output::success("Settings saved");
        }
    }

    Ok(())
}
