// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use serde_json::json;

use super::open_context;
use crate::cli::OutputFormat;
use crate::context::SyncContext;
use crate::error::Result;

pub async fn run(state_dir: &Path, offline: bool, output: OutputFormat) -> Result<()> {
    let ctx = open_context(state_dir, offline).await?;
    println!("{}", status_impl(&ctx, output)?);
    Ok(())
}

pub(crate) fn status_impl(ctx: &SyncContext, output: OutputFormat) -> Result<String> {
    let status = ctx.dispatcher.status()?;
    let session = ctx.store.get_session()?;
    let schema_version = ctx.store.schema_version()?;

    if output == OutputFormat::Json {
        let value = json!({
            "pendingCount": status.pending,
            "failedCount": status.dead_letters,
            "isOnline": status.online,
            "isDraining": status.draining,
            "authenticationRequired": status.auth_required,
            "lastSyncTime": status.last_sync_at.map(|t| t.to_rfc3339()),
            "session": session.as_ref().map(|s| json!({
                "driverId": s.driver_id,
                "routeId": s.route_id,
                "expiresAt": s.expires_at.to_rfc3339(),
            })),
            "stateDir": ctx.state_dir.display().to_string(),
            "remoteUrl": ctx.gateway.base_url(),
            "schemaVersion": schema_version,
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut lines = vec![
        format!("Remote:     {}", ctx.gateway.base_url()),
        format!(
            "Network:    {}",
            if status.online { "online" } else { "offline" }
        ),
        format!("Pending:    {}", status.pending),
    ];
    if status.dead_letters > 0 {
        lines.push(format!(
            "Failed:     {} (see 'courier queue failed')",
            status.dead_letters
        ));
    }
    lines.push(match &session {
        Some(s) => format!(
            "Session:    {} until {}",
            s.driver_id,
            s.expires_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => "Session:    not logged in".to_string(),
    });
    lines.push(match status.last_sync_at {
        Some(at) => format!("Last sync:  {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => "Last sync:  never".to_string(),
    });
    lines.push(format!("Store:      schema v{}", schema_version));
    Ok(lines.join("\n"))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
