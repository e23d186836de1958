// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::ScanArgs;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first action outbox for delivery drivers")]
#[command(
    long_about = "Offline-first action outbox for delivery drivers.\n\n\
    Actions taken in the field are stored durably and replayed against the \
    dispatch backend, in order, once the device is back online."
)]
pub struct Cli {
    /// Treat the backend as unreachable: queue only, read from the cache
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────
    /// Mark a route task as complete
    #[command(name = "complete-task")]
    CompleteTask {
        #[arg(value_parser = non_empty_string)]
        task_id: String,
    },

    /// Report arrival or progress at a stop
    #[command(
        name = "update-status",
        after_help = "Examples:\n  courier update-status S1 ARRIVED"
    )]
    UpdateStatus {
        #[arg(value_parser = non_empty_string)]
        stop_id: String,
        #[arg(value_parser = non_empty_string)]
        status: String,
    },

    /// Complete an order, optionally with proof of delivery
    #[command(
        name = "complete-order",
        after_help = "Examples:\n  courier complete-order O1 --proof '{\"signature\":\"...\"}'"
    )]
    CompleteOrder {
        #[arg(value_parser = non_empty_string)]
        order_id: String,

        /// Proof of delivery as JSON
        #[arg(long)]
        proof: Option<String>,
    },

    /// Record a package scan
    Scan {
        #[arg(value_parser = non_empty_string)]
        asset_id: String,

        /// Scan type reported to the backend
        #[arg(long, default_value = "DELIVERY_SUCCESS")]
        scan_type: String,

        #[command(flatten)]
        reading: ScanArgs,
    },

    /// Upload a photo for an order
    Photo {
        #[arg(value_parser = non_empty_string)]
        order_id: String,
        /// Image file to upload
        file: std::path::PathBuf,
    },

    /// Queue a raw action (type and JSON payload)
    #[command(after_help = "Examples:\n  courier enqueue COMPLETE_TASK '{\"taskId\":\"T1\"}'")]
    Enqueue {
        /// COMPLETE_TASK, STATUS_UPDATE, COMPLETE_ORDER, SCAN_EVENT or PHOTO_UPLOAD
        action_type: String,
        /// Payload as a JSON object
        payload: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Queue
    // ─────────────────────────────────────────────────────────────────────────
    /// Inspect the queue of actions waiting to be replayed
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Replay queued actions now
    Sync,

    /// Replay continuously as connectivity comes and goes, until Ctrl-C
    Watch,

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────
    /// Show assigned orders (offline cache fallback)
    Orders {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Show today's route tasks (offline cache fallback)
    Route {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────
    /// Log in with a magic link
    #[command(subcommand)]
    Login(LoginCommand),

    /// Forget the session; queued actions are kept
    Logout,

    /// Show queue, connectivity, and session state
    Status {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// List pending actions in replay order
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// List actions quarantined as undeliverable
    Failed {
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Delete all quarantined actions
    #[command(name = "purge-failed")]
    PurgeFailed,
}

#[derive(Subcommand, Debug)]
pub enum LoginCommand {
    /// Ask the backend to send a login link
    Request {
        /// Phone number or email address
        #[arg(value_parser = non_empty_string)]
        identifier: String,
    },
    /// Exchange the token from the link for a session
    Exchange {
        #[arg(value_parser = non_empty_string)]
        token: String,
    },
}

#[cfg(test)]
#[path = "cli_tests/mod.rs"]
mod tests;
