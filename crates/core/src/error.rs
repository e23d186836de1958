// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cr-core operations.

use thiserror::Error;

use crate::queue::ItemId;

/// All possible errors that can occur in cr-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}\n  hint: queued actions were not modified; check the state directory")]
    StorageUnavailable(String),

    #[error("unknown action type: '{0}'\n  hint: valid types are: COMPLETE_TASK, STATUS_UPDATE, COMPLETE_ORDER, SCAN_EVENT, PHOTO_UPLOAD")]
    UnknownActionType(String),

    #[error("invalid payload for {action_type}: {reason}")]
    InvalidPayload { action_type: String, reason: String },

    #[error("invalid item status: '{0}'")]
    InvalidStatus(String),

    #[error("queue item not found: {0}")]
    ItemNotFound(ItemId),
}

impl Error {
    /// Returns true if the error means the action can never be delivered,
    /// no matter how many times it is retried.
    pub fn is_unprocessable(&self) -> bool {
        matches!(
            self,
            Error::UnknownActionType(_) | Error::InvalidPayload { .. }
        )
    }

    pub(crate) fn corrupted(detail: impl std::fmt::Display) -> Self {
        Error::StorageUnavailable(format!("corrupted data: {detail}"))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}

/// A specialized Result type for cr-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
