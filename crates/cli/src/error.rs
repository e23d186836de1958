// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::TransportError;

/// All possible errors that can occur in the courier library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}\n  hint: queued actions were not modified; check the state directory")]
    StorageUnavailable(String),

    #[error("{0}")]
    Core(cr_core::Error),

    #[error("not logged in\n  hint: run 'courier login request <identifier>' and then 'courier login exchange <token>'")]
    NotLoggedIn,

    #[error("remote call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("no data available for {kind}\n  hint: connect once while online to populate the offline cache")]
    NoData { kind: String },

    #[error("invalid JSON for {what}: {reason}")]
    InvalidJson { what: &'static str, reason: String },

    #[error("cannot read {path}: {reason}")]
    FileRead { path: PathBuf, reason: String },

    #[error("another courier watch is already running\n  hint: lock held at {0}")]
    AlreadyRunning(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for courier operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<cr_core::Error> for Error {
    fn from(e: cr_core::Error) -> Self {
        match e {
            cr_core::Error::StorageUnavailable(msg) => Error::StorageUnavailable(msg),
            other => Error::Core(other),
        }
    }
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotLoggedIn | Error::Transport(TransportError::Unauthorized) => 3,
            Error::StorageUnavailable(_) => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
