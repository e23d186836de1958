// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! One-shot commands log warnings to stderr. `courier watch` appends to
//! `<state>/courier.log` and falls back to stderr if the file cannot be
//! opened. `RUST_LOG` overrides the default level in both cases.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env;

fn filter(default: &str) -> EnvFilter {
    if env::rust_log_set() {
        // An unparseable RUST_LOG falls back to the default level.
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    EnvFilter::new(default)
}

/// Stderr logging for one-shot commands.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("warn"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// File logging for the long-running watcher.
pub fn setup_logging(log_path: &Path) {
    let filter = filter("info");

    // Try to open log file, fall back to stderr
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
