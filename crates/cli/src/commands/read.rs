// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network-first reads of assigned orders and route tasks.

use std::path::Path;

use serde_json::Value;

use cr_core::{KIND_ORDERS, KIND_TASKS};

use super::open_context;
use crate::cli::OutputFormat;
use crate::context::SyncContext;
use crate::error::{Error, Result};
use crate::sync::{CacheRead, TransportError, TransportResult};

const ORDERS_PATH: &str = "/orders/assigned";
const TASKS_PATH: &str = "/driver/tasks";

/// Wrapper keys a list endpoint may nest its records under.
const LIST_KEYS: &[&str] = &["orders", "tasks", "items", "data", "content"];

pub async fn orders(state_dir: &Path, offline: bool, output: OutputFormat) -> Result<()> {
    let ctx = open_context(state_dir, offline).await?;
    let read = orders_impl(&ctx).await?;
    print_read(KIND_ORDERS, &read, output)
}

pub(crate) async fn orders_impl(ctx: &SyncContext) -> Result<CacheRead> {
    if !ctx.is_online() {
        return ctx.cache.cached(KIND_ORDERS);
    }
    ctx.cache
        .refresh(KIND_ORDERS, || async {
            let body = ctx.gateway.fetch_json(ORDERS_PATH, &[]).await?;
            records(ORDERS_PATH, body)
        })
        .await
}

pub async fn route(state_dir: &Path, offline: bool, output: OutputFormat) -> Result<()> {
    let ctx = open_context(state_dir, offline).await?;
    let read = route_impl(&ctx).await?;
    print_read(KIND_TASKS, &read, output)
}

/// Tasks for the logged-in driver. Offline, or without a session, only the
/// cache is consulted; an empty cache without a session means the driver
/// has to log in first.
pub(crate) async fn route_impl(ctx: &SyncContext) -> Result<CacheRead> {
    let Some(session) = ctx.store.get_session()? else {
        return match ctx.cache.cached(KIND_TASKS)? {
            CacheRead::NoData => Err(Error::NotLoggedIn),
            read => Ok(read),
        };
    };
    if !ctx.is_online() {
        return ctx.cache.cached(KIND_TASKS);
    }
    ctx.cache
        .refresh(KIND_TASKS, || async {
            let body = ctx
                .gateway
                .fetch_json(TASKS_PATH, &[("driverId", session.driver_id.as_str())])
                .await?;
            records(TASKS_PATH, body)
        })
        .await
}

/// Extracts the record list from a response body: a bare array, or an
/// object wrapping one under a well-known key.
fn records(path: &str, body: Value) -> TransportResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| malformed(path)),
        _ => Err(malformed(path)),
    }
}

fn malformed(path: &str) -> TransportError {
    TransportError::Rejected {
        status: 200,
        body: format!("{path} did not return a list"),
    }
}

fn print_read(kind: &str, read: &CacheRead, output: OutputFormat) -> Result<()> {
    if let CacheRead::NoData = read {
        return Err(Error::NoData {
            kind: kind.to_string(),
        });
    }
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(read.records())?),
        OutputFormat::Text => {
            if let CacheRead::Cached { cached_at, .. } = read {
                println!(
                    "Offline: showing {} cached {}",
                    cached_at.format("%Y-%m-%d %H:%M"),
                    kind
                );
            }
            for record in read.records() {
                println!("{}", format_record(record));
            }
            if read.records().is_empty() {
                println!("No {}", kind);
            }
        }
    }
    Ok(())
}

/// One line per record: id, status, then the most descriptive field present.
fn format_record(record: &Value) -> String {
    let field = |key: &str| match record.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let mut parts = vec![field("id").unwrap_or_else(|| "-".to_string())];
    parts.extend(field("status"));
    parts.extend(
        ["customerName", "address", "description"]
            .iter()
            .find_map(|key| field(key)),
    );
    parts.join("  ")
}

#[cfg(test)]
#[path = "read_tests.rs"]
mod tests;
