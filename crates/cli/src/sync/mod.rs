// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! Driver actions are written to the durable queue first and replayed to the
//! backend later, once, in the order they happened.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Producers  │────►│ DurableStore │────►│ Dispatcher  │
//! │ (commands)  │     │   (SQLite)   │event│(SyncDispatch│
//! └─────────────┘     └──────────────┘     └──────┬──────┘
//!                            ▲                    │ encode
//!                            │ mirror             ▼
//! ┌─────────────┐     ┌──────┴───────┐     ┌─────────────┐
//! │Connectivity │     │ ReadThrough  │     │  Gateway    │────► Backend
//! │  Monitor    │     │    Cache     │     │  (trait)    │
//! └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! # Features
//!
//! - Durable FIFO queue with crash-safe commits
//! - Single active drain, halting on the first retryable failure
//! - Idempotency keys stable across replays
//! - Quarantine for items that can never be delivered
//! - Debounced connectivity transitions
//! - Injectable gateway trait for testing

mod cache;
mod connectivity;
mod dispatcher;
mod gateway;

pub use cache::{CacheRead, ReadThroughCache};
pub use connectivity::{poll, probe, ConnectivityMonitor};
pub use dispatcher::{DrainReport, HaltReason, SyncDispatcher, SyncSignal, SyncStatus};
pub use gateway::{
    HttpGateway, MagicLinkGrant, RemoteGateway, TransportError, TransportResult,
    IDEMPOTENCY_HEADER,
};

#[cfg(test)]
mod test_helpers;
