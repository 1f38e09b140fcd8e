use anyhow::{Context as _, Result};
use lyricwalk_game::{refresh_markers, spawn_daily_refresh};

use super::{print_json, Context};

pub async fn run_refresh(ctx: &Context, daemon: bool) -> Result<()> {
    if daemon {
        return run_daemon(ctx).await;
    }

    let report = refresh_markers(&ctx.store, ctx.config.refresh_retries).await?;

    if ctx.json {
        return print_json(&report);
    }

    println!(
        "✓ Placed {} markers ({} current, {} classic)",
        report.total(),
        report.current,
        report.classic
    );
    for category in &report.exhausted {
        println!("  ⚠ Could not place {} markers: sampling ran out of attempts", category);
    }

    Ok(())
}

async fn run_daemon(ctx: &Context) -> Result<()> {
    let schedule = ctx.config.refresh_schedule()?;
    let handle = spawn_daily_refresh(ctx.store.clone(), schedule, ctx.config.refresh_retries);

    println!(
        "Refreshing markers daily at {}. Press Ctrl-C to stop.",
        schedule.time().format("%H:%M")
    );
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    handle.abort();
    ctx.store.close().await;
    log::info!("Refresh daemon stopped");
    Ok(())
}
