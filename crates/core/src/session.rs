// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The authenticated driver session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated identity for this device. At most one exists at a time.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub driver_id: String,
    /// Bearer token injected into every remote call.
    pub token: String,
    pub route_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session valid for `ttl` from now.
    pub fn new(driver_id: impl Into<String>, token: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Session {
            driver_id: driver_id.into(),
            token: token.into(),
            route_id: None,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn with_route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// Keeps the bearer token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("driver_id", &self.driver_id)
            .field("token", &"<redacted>")
            .field("route_id", &self.route_id)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
