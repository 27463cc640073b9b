//! CLI command implementations

pub mod config;
pub mod history;
pub mod logs;
pub mod register;
pub mod send;
pub mod status;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{Input, Password};
use wallet_core::services::{EntryPoint, LoggingService};
use wallet_core::{Identity, WalletContext};

use crate::output;

/// Credentials for commands that need a session
#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Username to sign in as
    #[arg(long, short, env = "WALLET_USERNAME")]
    pub username: Option<String>,
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let wallet_dir = get_wallet_dir().ok()?;
    std::fs::create_dir_all(&wallet_dir).ok()?;
    LoggingService::new(&wallet_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Wallet directory from WALLET_DIR, or ~/.custodial-wallet
pub fn get_wallet_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WALLET_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".custodial-wallet"))
        .context("Could not find home directory; set WALLET_DIR")
}

/// Build the client context and record the command being run
pub fn get_context(command: &str) -> Result<WalletContext> {
    let wallet_dir = get_wallet_dir()?;

    std::fs::create_dir_all(&wallet_dir)
        .with_context(|| format!("Failed to create wallet directory: {:?}", wallet_dir))?;

    let logger = get_logger();
    if let Some(l) = &logger {
        let _ = l.log_command(command);
    }

    WalletContext::new(&wallet_dir, logger).context("Failed to initialize wallet client")
}

fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Username from the flag / WALLET_USERNAME, or an interactive prompt
pub fn resolve_username(username: Option<String>) -> Result<String> {
    if let Some(u) = username.filter(|u| !u.trim().is_empty()) {
        return Ok(u);
    }
    if !is_interactive() {
        anyhow::bail!("No username given. Pass --username or set WALLET_USERNAME");
    }
    Ok(Input::<String>::new().with_prompt("Username").interact_text()?)
}

/// Password from WALLET_PASSWORD, or a hidden prompt
pub fn resolve_password(confirm: bool) -> Result<String> {
    if let Ok(p) = std::env::var("WALLET_PASSWORD") {
        return Ok(p);
    }
    if !is_interactive() {
        anyhow::bail!("No password given. Set WALLET_PASSWORD or run interactively");
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

/// Sign in with the resolved credentials; the first snapshot is loaded
/// before this returns
pub async fn sign_in(ctx: &WalletContext, auth: AuthArgs, quiet: bool) -> Result<Identity> {
    let username = resolve_username(auth.username)?;
    let password = resolve_password(false)?;

    let spinner = output::spinner("Signing in...", quiet);
    let result = ctx.client.login(&username, &password).await;
    spinner.finish_and_clear();

    Ok(result?)
}
