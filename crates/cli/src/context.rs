// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Explicitly constructed wiring of the sync components.
//!
//! Commands receive a [`SyncContext`] instead of reaching for globals, so
//! tests can build one over a temporary state directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use cr_core::DurableStore;

use crate::config::{db_path, Config};
use crate::error::Result;
use crate::sync::{probe, ConnectivityMonitor, HttpGateway, ReadThroughCache, SyncDispatcher};

/// Upper bound for the one-shot reachability reading.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// The components one courier process works with.
pub struct SyncContext {
    pub state_dir: PathBuf,
    pub config: Config,
    pub store: Arc<DurableStore>,
    pub gateway: Arc<HttpGateway>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub dispatcher: Arc<SyncDispatcher<HttpGateway>>,
    pub cache: ReadThroughCache,
}

impl SyncContext {
    /// Context for a one-shot command. Connectivity is a single reading,
    /// skipped entirely when `offline` is set.
    pub async fn open(state_dir: &Path, offline: bool) -> Result<Self> {
        let config = load_config(state_dir)?;
        let online = !offline && probe(&config.remote.url, probe_timeout(&config)).await;
        debug!(online, offline, "connectivity reading");
        Self::build(state_dir, config, ConnectivityMonitor::fixed(online))
    }

    /// Context for `courier watch`: the monitor debounces readings, so its
    /// run loop must be spawned alongside the dispatcher.
    pub async fn open_watching(state_dir: &Path) -> Result<Self> {
        let config = load_config(state_dir)?;
        let online = probe(&config.remote.url, probe_timeout(&config)).await;
        let connectivity = ConnectivityMonitor::new(online, config.sync.debounce());
        Self::build(state_dir, config, connectivity)
    }

    /// Wires the components over an explicit monitor.
    pub fn build(
        state_dir: &Path,
        config: Config,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        let store = Arc::new(DurableStore::open(&db_path(state_dir))?);
        let gateway = Arc::new(HttpGateway::new(
            &config.remote.url,
            config.remote.timeout(),
            Arc::clone(&store),
        )?);
        let dispatcher = Arc::new(SyncDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            Arc::clone(&connectivity),
            config.sync.rejected_retry_limit,
        ));
        let cache = ReadThroughCache::new(Arc::clone(&store));

        Ok(SyncContext {
            state_dir: state_dir.to_path_buf(),
            config,
            store,
            gateway,
            connectivity,
            dispatcher,
            cache,
        })
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }
}

fn load_config(state_dir: &Path) -> Result<Config> {
    Config::load(state_dir)?.with_env_overrides()
}

fn probe_timeout(config: &Config) -> Duration {
    config.remote.timeout().min(PROBE_TIMEOUT)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
