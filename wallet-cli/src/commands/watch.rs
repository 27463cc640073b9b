//! Watch command - keep the session open and print every poll

use anyhow::Result;
use colored::Colorize;

use super::{get_context, sign_in, AuthArgs};
use crate::output;

pub async fn run(auth: AuthArgs) -> Result<()> {
    let ctx = get_context("watch")?;
    let identity = sign_in(&ctx, auth, false).await?;

    println!(
        "{}",
        format!(
            "Watching {}'s wallet every {}s. Press Ctrl-C to stop.",
            identity.username,
            ctx.client.poll_interval().as_secs()
        )
        .dimmed()
    );
    println!("{}", output::snapshot_table(&ctx.client.snapshot()));

    let mut cycles = ctx.client.subscribe();
    let mut last = ctx.client.snapshot();

    loop {
        tokio::select! {
            changed = cycles.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = ctx.client.snapshot();
                let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
                if snapshot.balance != last.balance || snapshot.transactions != last.transactions {
                    println!("{} {}", stamp.dimmed(), "wallet changed".yellow());
                    println!("{}", output::snapshot_table(&snapshot));
                } else {
                    println!("{} balance {} ETH", stamp.dimmed(), snapshot.balance);
                }
                last = snapshot;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ctx.client.logout();
    println!();
    println!("{}", "Signed out".dimmed());
    Ok(())
}
