// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod actions;
pub mod auth;
pub mod queue;
pub mod read;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::Path;

use crate::context::SyncContext;
use crate::error::Result;
use crate::sync::{DrainReport, HaltReason};

/// Helper to open the context for a one-shot command.
pub async fn open_context(state_dir: &Path, offline: bool) -> Result<SyncContext> {
    SyncContext::open(state_dir, offline).await
}

/// One-line summary of a drain for the terminal.
pub(crate) fn describe_report(report: &DrainReport) -> String {
    let mut line = format!("Delivered {}", report.delivered);
    if report.discarded > 0 {
        line.push_str(&format!(", quarantined {}", report.discarded));
    }
    match &report.halted {
        None => {}
        Some(HaltReason::Transient { id, message }) => {
            line.push_str(&format!("; stopped at #{id}, will retry: {message}"));
        }
        Some(HaltReason::Unauthorized { id }) => {
            line.push_str(&format!("; stopped at #{id}: authentication required"));
        }
        Some(HaltReason::Rejected {
            id,
            status,
            rejections,
        }) => {
            line.push_str(&format!(
                "; stopped at #{id}: rejected with status {status} (attempt {rejections})"
            ));
        }
        Some(HaltReason::Abandoned) => line.push_str("; abandoned"),
    }
    line
}
