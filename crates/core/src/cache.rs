// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through mirrors of server-owned records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cache kind for orders assigned to the driver.
pub const KIND_ORDERS: &str = "orders";
/// Cache kind for the driver's route tasks.
pub const KIND_TASKS: &str = "tasks";

/// Last-known-good copy of one server record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntity {
    /// Server id.
    pub id: String,
    /// Record as the server returned it.
    pub data: Value,
    pub cached_at: DateTime<Utc>,
}

impl CachedEntity {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        CachedEntity {
            id: id.into(),
            data,
            cached_at: Utc::now(),
        }
    }

    /// Wraps a server record, taking its id from the `id` field.
    ///
    /// Returns `None` when the record has no string or numeric `id`.
    pub fn from_record(data: Value) -> Option<Self> {
        let id = match data.get("id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(CachedEntity::new(id, data))
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
