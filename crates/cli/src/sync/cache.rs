// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network-first reads with an offline fallback.
//!
//! A successful fetch replaces the whole cached mirror for its kind. A
//! failed fetch returns the last mirror untouched, never a blend of the two.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use cr_core::{CachedEntity, DurableStore};

use super::gateway::TransportResult;
use crate::error::Result;

/// Where a read was served from.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
    /// Fresh from the server; the mirror has been replaced.
    Live(Vec<Value>),
    /// Last mirror, because the fetch failed or was skipped.
    Cached {
        records: Vec<Value>,
        cached_at: DateTime<Utc>,
    },
    /// Nothing fetched and nothing cached.
    NoData,
}

impl CacheRead {
    pub fn records(&self) -> &[Value] {
        match self {
            CacheRead::Live(records) | CacheRead::Cached { records, .. } => records,
            CacheRead::NoData => &[],
        }
    }
}

/// Mirrors server records into the store for offline reads.
pub struct ReadThroughCache {
    store: Arc<DurableStore>,
}

impl ReadThroughCache {
    pub fn new(store: Arc<DurableStore>) -> Self {
        ReadThroughCache { store }
    }

    /// Tries `fetcher`; falls back to the mirror for `kind` on failure.
    ///
    /// A storage failure while saving a successful fetch is returned as an
    /// error rather than silently serving uncached data.
    pub async fn refresh<F, Fut>(&self, kind: &str, fetcher: F) -> Result<CacheRead>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TransportResult<Vec<Value>>>,
    {
        match fetcher().await {
            Ok(records) => {
                let entities = mirror_entities(kind, &records);
                self.store.put_cached_entities(kind, &entities)?;
                debug!(kind, count = records.len(), "cache refreshed");
                Ok(CacheRead::Live(records))
            }
            Err(e) => {
                warn!(kind, error = %e, "fetch failed, reading offline cache");
                self.cached(kind)
            }
        }
    }

    /// The last mirror for `kind`, without trying the network.
    ///
    /// An empty mirror reads as [`CacheRead::NoData`].
    pub fn cached(&self, kind: &str) -> Result<CacheRead> {
        let entities = self.store.get_cached_entities(kind)?;
        let Some(cached_at) = entities.iter().map(|e| e.cached_at).min() else {
            return Ok(CacheRead::NoData);
        };
        Ok(CacheRead::Cached {
            records: entities.into_iter().map(|e| e.data).collect(),
            cached_at,
        })
    }
}

/// Keys every fetched record uniquely so the mirror holds exactly what the
/// live read returned. Records without an id are keyed by position; a key
/// already taken gets the position appended until it is free.
fn mirror_entities(kind: &str, records: &[Value]) -> Vec<CachedEntity> {
    let mut taken = HashSet::with_capacity(records.len());
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let entity = CachedEntity::from_record(record.clone())
                .unwrap_or_else(|| CachedEntity::new(format!("#{index}"), record.clone()));
            if taken.contains(&entity.id) {
                warn!(kind, id = %entity.id, index, "duplicate record id in fetch");
            }
            let mut key = entity.id.clone();
            while !taken.insert(key.clone()) {
                key = format!("{key}#{index}");
            }
            CachedEntity { id: key, ..entity }
        })
        .collect()
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
