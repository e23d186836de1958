// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! courier - An offline-first action outbox for delivery drivers.
//!
//! Driver actions (completing tasks and orders, status updates at stops,
//! package scans, photos) are written to a durable local queue first and
//! replayed against the dispatch backend in capture order whenever the
//! device is online.
//!
//! # Main Components
//!
//! - [`SyncContext`] - Explicit wiring of the store, gateway, connectivity
//!   monitor, dispatcher, and read-through cache
//! - [`sync`] - Replay engine ([`SyncDispatcher`](sync::SyncDispatcher)) and
//!   its collaborators
//! - [`Config`] - Remote endpoint and replay settings
//! - [`Error`] - Error types for all operations
//!
//! ```rust,ignore
//! use courier::{config, SyncContext};
//! use cr_core::Action;
//!
//! let ctx = SyncContext::open(&config::state_dir(), false).await?;
//! ctx.dispatcher.enqueue(&Action::complete_task("T1"))?;
//! ctx.dispatcher.drain().await?;
//! ```

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, LoginCommand, OutputFormat, QueueCommand, ScanArgs};
pub use config::Config;
pub use context::SyncContext;
pub use error::{Error, Result};

use cr_core::Action;

use commands::{actions, auth, queue, read, status};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let state_dir = config::state_dir();
    let offline = cli.offline;

    if !matches!(cli.command, Command::Watch) {
        logging::init_stderr();
    }

    match cli.command {
        Command::CompleteTask { task_id } => {
            actions::run(&state_dir, offline, Action::complete_task(&task_id)).await
        }
        Command::UpdateStatus { stop_id, status } => {
            actions::run(&state_dir, offline, Action::status_update(&stop_id, &status)).await
        }
        Command::CompleteOrder { order_id, proof } => {
            let action = actions::complete_order(&order_id, proof.as_deref())?;
            actions::run(&state_dir, offline, action).await
        }
        Command::Scan {
            asset_id,
            scan_type,
            reading,
        } => {
            let action = Action::scan_event(&reading.reading(&asset_id, &scan_type));
            actions::run(&state_dir, offline, action).await
        }
        Command::Photo { order_id, file } => {
            let action = actions::photo(&order_id, &file)?;
            actions::run(&state_dir, offline, action).await
        }
        Command::Enqueue {
            action_type,
            payload,
        } => {
            let action = actions::raw(&action_type, &payload)?;
            actions::run(&state_dir, offline, action).await
        }
        Command::Queue(QueueCommand::List { output }) => queue::list(&state_dir, output).await,
        Command::Queue(QueueCommand::Failed { output }) => queue::failed(&state_dir, output).await,
        Command::Queue(QueueCommand::PurgeFailed) => queue::purge_failed(&state_dir).await,
        Command::Sync => commands::sync::run(&state_dir, offline).await,
        Command::Watch => commands::sync::watch(&state_dir).await,
        Command::Orders { output } => read::orders(&state_dir, offline, output).await,
        Command::Route { output } => read::route(&state_dir, offline, output).await,
        Command::Login(LoginCommand::Request { identifier }) => {
            auth::request(&state_dir, &identifier).await
        }
        Command::Login(LoginCommand::Exchange { token }) => {
            auth::exchange(&state_dir, &token).await
        }
        Command::Logout => auth::logout(&state_dir).await,
        Command::Status { output } => status::run(&state_dir, offline, output).await,
    }
}
