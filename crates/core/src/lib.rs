// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cr-core: Durable state for the courier offline sync engine
//!
//! This crate provides the data types, the action codec, and the SQLite-backed
//! store shared by the sync engine and the `courier` CLI. Nothing in here
//! touches the network.

pub mod action;
pub mod cache;
pub mod codec;
pub mod error;
pub mod queue;
pub mod session;
pub mod store;

pub use action::{Action, ActionType, ScanReading};
pub use cache::{CachedEntity, KIND_ORDERS, KIND_TASKS};
pub use codec::{encode, idempotency_key, CallDescriptor, Method};
pub use error::{Error, Result};
pub use queue::{DeadLetter, ItemId, ItemStatus, QueueItem};
pub use session::Session;
pub use store::{DurableStore, QueueChange, StoreEvent, SCHEMA_VERSION};
