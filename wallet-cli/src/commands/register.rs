//! Register command - create an account, then sign in to it

use anyhow::Result;
use colored::Colorize;
use dialoguer::Input;
use wallet_core::OperationResult;

use super::{get_context, resolve_password, resolve_username};
use crate::output;

fn resolve_email(email: Option<String>) -> Result<String> {
    if let Some(e) = email.filter(|e| !e.trim().is_empty()) {
        return Ok(e);
    }
    if atty::isnt(atty::Stream::Stdin) {
        anyhow::bail!("No email given. Pass --email");
    }
    Ok(Input::<String>::new().with_prompt("Email").interact_text()?)
}

pub async fn run(username: Option<String>, email: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context("register")?;

    let username = resolve_username(username)?;
    let email = resolve_email(email)?;
    let password = resolve_password(true)?;

    let spinner = output::spinner("Creating account...", json);
    let result = ctx.client.register(&username, &email, &password).await;
    spinner.finish_and_clear();
    let identity = result?;

    let snapshot = ctx.client.snapshot();
    ctx.client.logout();

    if json {
        let result = OperationResult::ok(&identity)
            .with_context("snapshot", serde_json::to_value(&snapshot)?);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::success(&format!("Account '{}' created", identity.username));
    println!("  Email: {}", identity.email);
    println!(
        "  Address: {}",
        snapshot.address.as_known().unwrap_or("not assigned yet").dimmed()
    );

    Ok(())
}
