// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Magic-link login and logout.

use std::path::Path;

use cr_core::Session;
use tracing::info;

use super::open_context;
use crate::context::SyncContext;
use crate::error::Result;

pub async fn request(state_dir: &Path, identifier: &str) -> Result<()> {
    let ctx = open_context(state_dir, false).await?;
    let response = ctx.gateway.request_magic_link(identifier).await?;
    println!("Login link sent to {}", identifier);
    if let Some(message) = response.get("message").and_then(|m| m.as_str()) {
        println!("{}", message);
    }
    Ok(())
}

pub async fn exchange(state_dir: &Path, token: &str) -> Result<()> {
    let ctx = open_context(state_dir, false).await?;
    let session = exchange_impl(&ctx, token).await?;
    println!(
        "Logged in as {} (expires {})",
        session.driver_id,
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    let pending = ctx.store.pending_count()?;
    if pending > 0 {
        println!("{} queued action(s) will replay with the new session", pending);
    }
    Ok(())
}

/// Trades the token for a session, stores it, and replays anything that
/// was waiting for authentication.
pub(crate) async fn exchange_impl(ctx: &SyncContext, token: &str) -> Result<Session> {
    let session = ctx.gateway.exchange_magic_link(token).await?.into_session();
    ctx.store.put_session(&session)?;
    ctx.dispatcher.session_changed();
    info!(driver_id = %session.driver_id, "logged in");

    if ctx.store.pending_count()? > 0 {
        ctx.dispatcher.drain().await?;
    }
    Ok(session)
}

pub async fn logout(state_dir: &Path) -> Result<()> {
    let ctx = open_context(state_dir, true).await?;
    logout_impl(&ctx)?;
    println!("Logged out; queued actions are kept");
    Ok(())
}

/// Stops any drain before its next item, then forgets the session. The
/// queue is left as is.
pub(crate) fn logout_impl(ctx: &SyncContext) -> Result<()> {
    ctx.dispatcher.abandon();
    ctx.store.clear_session()?;
    Ok(())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
