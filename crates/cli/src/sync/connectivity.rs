// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced network reachability.
//!
//! A platform signal (or, for the CLI, a TCP probe of the API host) feeds raw
//! readings through [`ConnectivityMonitor::report`]. A reading only becomes
//! the published state once it has stayed unchanged for the debounce window,
//! so a flapping link produces at most one transition per stable change.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Publishes the debounced online/offline state.
pub struct ConnectivityMonitor {
    raw: watch::Sender<bool>,
    state: watch::Sender<bool>,
    debounce: Duration,
}

impl ConnectivityMonitor {
    /// Creates a monitor starting in `initial`.
    ///
    /// With a non-zero `debounce`, [`run`](Self::run) must be spawned for
    /// readings to be published.
    pub fn new(initial: bool, debounce: Duration) -> Arc<Self> {
        let (raw, _) = watch::channel(initial);
        let (state, _) = watch::channel(initial);
        Arc::new(ConnectivityMonitor {
            raw,
            state,
            debounce,
        })
    }

    /// A monitor that never debounces. Used for one-shot commands.
    pub fn fixed(online: bool) -> Arc<Self> {
        Self::new(online, Duration::ZERO)
    }

    /// Current published state.
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Feeds one raw reading from the platform signal.
    pub fn report(&self, online: bool) {
        self.raw.send_replace(online);
        if self.debounce.is_zero() {
            self.publish(online);
        }
    }

    /// Receiver that observes every published transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Calls `listener` with the new state after each published transition.
    pub fn on_change<F>(&self, listener: F) -> JoinHandle<()>
    where
        F: Fn(bool) + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                listener(online);
            }
        })
    }

    fn publish(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            info!(online, "connectivity changed");
        }
    }

    /// Debounce loop. Runs until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut raw = self.raw.subscribe();
        if *raw.borrow() != self.is_online() {
            raw.mark_changed();
        }
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = raw.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }

            // Wait for the reading to hold still for a full window.
            loop {
                let candidate = *raw.borrow_and_update();
                let deadline = Instant::now() + self.debounce;
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = sleep_until(deadline) => {
                        self.publish(candidate);
                        break;
                    }
                    changed = raw.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        debug!(candidate, "connectivity flapped, restarting debounce");
                    }
                }
            }
        }
    }
}

/// TCP reachability of the host behind `base_url`.
///
/// The CLI's stand-in for the platform online/offline signal: a heuristic,
/// not a promise that the next call succeeds.
pub async fn probe(base_url: &str, timeout: Duration) -> bool {
    let Ok(url) = Url::parse(base_url) else {
        return false;
    };
    let (Some(host), Some(port)) = (url.host_str(), url.port_or_known_default()) else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Probes `base_url` every `interval` and reports each reading to `monitor`.
pub async fn poll(
    monitor: Arc<ConnectivityMonitor>,
    base_url: String,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let online = probe(&base_url, timeout).await;
                debug!(online, "reachability probe");
                monitor.report(online);
            }
        }
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
