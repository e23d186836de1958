// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue records: pending items and quarantined dead letters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::action::ActionType;
use crate::error::{Error, Result};

/// Store-assigned identifier of a queue item. Monotonic, never reused.
pub type ItemId = i64;

/// Lifecycle of a queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Waiting for the next drain.
    Pending,
    /// Being dispatched right now. Held in memory only.
    InFlight,
    /// Quarantined; will not be retried.
    Failed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InFlight => "in_flight",
            ItemStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ItemStatus::Pending),
            "in_flight" => Ok(ItemStatus::InFlight),
            "failed" => Ok(ItemStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// One captured action waiting to be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: ItemId,
    /// Raw tag as stored. Kept as a string so rows written by a build with
    /// more action types still load.
    pub action_type: String,
    pub payload: Value,
    /// Capture time. Display only; replay order is the store's insertion order.
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub status: ItemStatus,
}

impl QueueItem {
    /// Parses the stored tag.
    pub fn kind(&self) -> Result<ActionType> {
        self.action_type.parse()
    }

    /// Returns a copy marked in flight, for the duration of one dispatch.
    pub fn in_flight(&self) -> Self {
        QueueItem {
            status: ItemStatus::InFlight,
            ..self.clone()
        }
    }
}

/// A queue item that was taken out of the live queue because it can never
/// be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub item: QueueItem,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
