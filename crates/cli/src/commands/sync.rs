// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replaying the queue: once (`courier sync`) or continuously
//! (`courier watch`).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{describe_report, open_context};
use crate::config::{lock_path, log_path};
use crate::context::SyncContext;
use crate::error::{Error, Result};
use crate::logging;
use crate::sync::{poll, DrainReport, HaltReason, SyncSignal, TransportError};

pub async fn run(state_dir: &Path, offline: bool) -> Result<()> {
    let ctx = open_context(state_dir, offline).await?;
    sync_impl(&ctx).await.map(|_| ())
}

/// Drains once and reports the outcome.
///
/// An unauthorized halt is returned as an error so the exit code reflects
/// that the driver must log in again.
pub(crate) async fn sync_impl(ctx: &SyncContext) -> Result<Option<DrainReport>> {
    let Some(report) = ctx.dispatcher.drain().await? else {
        let pending = ctx.store.pending_count()?;
        if !ctx.is_online() {
            println!("Offline: {} action(s) pending", pending);
        } else {
            println!("Nothing replayed: {} action(s) pending", pending);
        }
        return Ok(None);
    };

    println!("{}", describe_report(&report));
    if matches!(report.halted, Some(HaltReason::Unauthorized { .. })) {
        return Err(Error::Transport(TransportError::Unauthorized));
    }
    Ok(Some(report))
}

/// Runs the dispatcher, the connectivity debounce, and the reachability
/// poll until Ctrl-C.
pub async fn watch(state_dir: &Path) -> Result<()> {
    fs::create_dir_all(state_dir)?;
    logging::setup_logging(&log_path(state_dir));

    // Held until this function returns.
    let _lock = acquire_lock(&lock_path(state_dir))?;

    let ctx = SyncContext::open_watching(state_dir).await?;
    info!(
        state_dir = %state_dir.display(),
        url = %ctx.config.remote.url,
        online = ctx.is_online(),
        "courier watch starting"
    );
    println!(
        "Watching {} ({} pending); Ctrl-C to stop",
        ctx.config.remote.url,
        ctx.store.pending_count()?
    );

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    tasks.push(tokio::spawn(
        Arc::clone(&ctx.connectivity).run(cancel.clone()),
    ));
    let probe_timeout = ctx.config.remote.timeout().min(ctx.config.sync.probe_interval());
    tasks.push(tokio::spawn(poll(
        Arc::clone(&ctx.connectivity),
        ctx.config.remote.url.clone(),
        ctx.config.sync.probe_interval(),
        probe_timeout,
        cancel.clone(),
    )));
    tasks.push(tokio::spawn(report_signals(
        ctx.dispatcher.subscribe(),
        cancel.clone(),
    )));

    let dispatcher = Arc::clone(&ctx.dispatcher);
    let token = cancel.clone();
    let runner = tokio::spawn(async move { dispatcher.run(token).await });

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, stopping");
    }
    info!("shutting down");
    cancel.cancel();

    if let Err(e) = runner.await {
        warn!(error = %e, "dispatcher task failed");
    }
    for task in tasks {
        let _ = task.await;
    }
    println!("Stopped ({} pending)", ctx.store.pending_count()?);
    info!("courier watch stopped");
    Ok(())
}

/// Prints dispatcher signals that matter to the person at the terminal.
async fn report_signals(
    mut signals: tokio::sync::broadcast::Receiver<SyncSignal>,
    cancel: CancellationToken,
) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        let signal = tokio::select! {
            _ = cancel.cancelled() => return,
            signal = signals.recv() => signal,
        };
        match signal {
            Ok(SyncSignal::Online(online)) => {
                println!("{}", if online { "Online" } else { "Offline" });
            }
            Ok(SyncSignal::AuthenticationRequired) => {
                println!("Authentication required: run 'courier login' to resume replay");
            }
            Ok(SyncSignal::Discarded { id, reason }) => {
                println!("Quarantined #{id}: {reason}");
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return,
        }
    }
}

/// Single-instance lock for `courier watch`.
fn acquire_lock(lock_path: &Path) -> Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning(lock_path.to_path_buf()))?;
    Ok(file)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
