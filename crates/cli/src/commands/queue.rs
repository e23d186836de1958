// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde_json::{json, Value};

use cr_core::{DeadLetter, QueueItem};

use super::open_context;
use crate::cli::OutputFormat;
use crate::context::SyncContext;
use crate::error::Result;

/// Payload fields worth showing in a one-line listing, in priority order.
const SUMMARY_FIELDS: &[&str] = &["taskId", "orderId", "stopId", "status", "assetId"];

pub async fn list(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let ctx = open_context(state_dir, true).await?;
    println!("{}", list_impl(&ctx, output)?);
    Ok(())
}

pub(crate) fn list_impl(ctx: &SyncContext, output: OutputFormat) -> Result<String> {
    let items = ctx.store.list_pending()?;
    Ok(match output {
        OutputFormat::Json => {
            let rows: Vec<Value> = items.iter().map(item_json).collect();
            serde_json::to_string_pretty(&rows)?
        }
        OutputFormat::Text if items.is_empty() => "Queue is empty".to_string(),
        OutputFormat::Text => items
            .iter()
            .map(|item| match item.kind() {
                Ok(_) => format_item(item),
                Err(_) => format!("{}  (unknown type, will be quarantined)", format_item(item)),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

pub async fn failed(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let ctx = open_context(state_dir, true).await?;
    println!("{}", failed_impl(&ctx, output)?);
    Ok(())
}

pub(crate) fn failed_impl(ctx: &SyncContext, output: OutputFormat) -> Result<String> {
    let letters = ctx.store.list_dead_letters()?;
    Ok(match output {
        OutputFormat::Json => {
            let rows: Vec<Value> = letters.iter().map(dead_letter_json).collect();
            serde_json::to_string_pretty(&rows)?
        }
        OutputFormat::Text if letters.is_empty() => "No failed actions".to_string(),
        OutputFormat::Text => letters
            .iter()
            .map(|letter| {
                format!(
                    "{}\n    failed {}: {}",
                    format_item(&letter.item),
                    letter.failed_at.format("%Y-%m-%d %H:%M"),
                    letter.reason
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

pub async fn purge_failed(state_dir: &Path) -> Result<()> {
    let ctx = open_context(state_dir, true).await?;
    let purged = ctx.store.purge_dead_letters()?;
    println!("Purged {} failed action(s)", purged);
    Ok(())
}

fn format_item(item: &QueueItem) -> String {
    let mut line = format!(
        "#{:<4} {:<15} {}",
        item.id,
        item.action_type,
        item.enqueued_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(summary) = summarize(&item.payload) {
        line.push_str("  ");
        line.push_str(&summary);
    }
    if item.retry_count > 0 {
        line.push_str(&format!("  (retries: {})", item.retry_count));
    }
    line
}

fn summarize(payload: &Value) -> Option<String> {
    let parts: Vec<String> = SUMMARY_FIELDS
        .iter()
        .filter_map(|field| {
            payload
                .get(*field)
                .and_then(Value::as_str)
                .map(|value| format!("{field}={value}"))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn item_json(item: &QueueItem) -> Value {
    json!({
        "id": item.id,
        "type": item.action_type,
        "payload": item.payload,
        "enqueuedAt": item.enqueued_at.to_rfc3339(),
        "retryCount": item.retry_count,
        "status": item.status.as_str(),
    })
}

fn dead_letter_json(letter: &DeadLetter) -> Value {
    let mut row = item_json(&letter.item);
    row["reason"] = Value::from(letter.reason.as_str());
    row["failedAt"] = Value::from(letter.failed_at.to_rfc3339());
    row
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
