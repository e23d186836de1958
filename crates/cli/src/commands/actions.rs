// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capturing driver actions.
//!
//! Every action is queued first and replayed second, whether or not the
//! backend is reachable right now.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use cr_core::{encode, Action, ActionType, ItemId};

use super::{describe_report, open_context};
use crate::context::SyncContext;
use crate::error::{Error, Result};
use crate::sync::{DrainReport, HaltReason};

/// What happened to a submitted action.
#[derive(Debug)]
pub struct Submitted {
    pub id: ItemId,
    /// `None` when no drain ran (offline, blocked, or already draining).
    pub report: Option<DrainReport>,
}

pub async fn run(state_dir: &Path, offline: bool, action: Action) -> Result<()> {
    let ctx = open_context(state_dir, offline).await?;
    submit(&ctx, &action).await?;
    Ok(())
}

/// Queues `action`, then drains if online.
pub(crate) async fn submit(ctx: &SyncContext, action: &Action) -> Result<Submitted> {
    let id = ctx.dispatcher.enqueue(action)?;
    println!("Queued {} #{}", action.action_type, id);

    let report = ctx.dispatcher.drain().await?;
    match &report {
        Some(report) => {
            println!("{}", describe_report(report));
            if matches!(report.halted, Some(HaltReason::Unauthorized { .. })) {
                eprintln!("hint: log in again; queued actions are kept until then");
            }
        }
        None if !ctx.is_online() => {
            println!("Offline: will replay when connectivity returns");
        }
        None => {}
    }
    Ok(Submitted { id, report })
}

/// Order completion with an optional JSON proof of delivery.
pub fn complete_order(order_id: &str, proof: Option<&str>) -> Result<Action> {
    let proof = proof.map(|raw| parse_json("proof", raw)).transpose()?;
    Ok(Action::complete_order(order_id, proof))
}

/// Photo upload with the file content base64-encoded.
pub fn photo(order_id: &str, file: &Path) -> Result<Action> {
    let bytes = fs::read(file).map_err(|e| Error::FileRead {
        path: file.to_path_buf(),
        reason: e.to_string(),
    })?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Action::photo_upload(order_id, &file_name, STANDARD.encode(bytes)))
}

/// A raw typed action. Rejected up front if it could never be replayed.
pub fn raw(action_type: &str, payload: &str) -> Result<Action> {
    let kind: ActionType = action_type.parse()?;
    let payload = parse_json("payload", payload)?;
    encode(kind.as_str(), &payload)?;
    Ok(Action::new(kind, payload))
}

fn parse_json(what: &'static str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::InvalidJson {
        what,
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
