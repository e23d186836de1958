// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered replay of the action queue.
//!
//! The dispatcher is either idle or draining. A drain takes a snapshot of
//! the pending items and replays them strictly in insertion order:
//!
//! - success removes the item and moves on
//! - a transient failure counts a retry and halts the drain
//! - a rejection counts a retry and halts, until the item has been
//!   rejected as often as the rejection limit and is quarantined;
//!   transient failures do not count toward that limit
//! - unauthorized halts without counting, and blocks further drains until
//!   the session changes
//! - an item that cannot be encoded is quarantined and skipped
//!
//! At most one drain runs at a time. The guard is a single atomic
//! check-and-set, so concurrent triggers cannot start a second drain.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cr_core::{encode, Action, DurableStore, ItemId, QueueChange, QueueItem, StoreEvent};

use super::connectivity::ConnectivityMonitor;
use super::gateway::{RemoteGateway, TransportError};
use crate::error::Result;

const SIGNAL_CAPACITY: usize = 64;

/// Why a drain stopped before the end of its snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Network error, timeout, or 5xx on this item.
    Transient { id: ItemId, message: String },
    /// The backend refused the session.
    Unauthorized { id: ItemId },
    /// The backend rejected this item; it stays queued until the limit.
    Rejected {
        id: ItemId,
        status: u16,
        rejections: u32,
    },
    /// Abandoned between items (logout or shutdown).
    Abandoned,
}

/// Outcome of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub discarded: usize,
    pub halted: Option<HaltReason>,
}

impl DrainReport {
    pub fn completed(&self) -> bool {
        self.halted.is_none()
    }
}

/// Signals for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSignal {
    PendingCount(usize),
    Online(bool),
    Draining(bool),
    AuthenticationRequired,
    Discarded { id: ItemId, reason: String },
}

/// Snapshot of the dispatcher and queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub pending: usize,
    pub dead_letters: usize,
    pub online: bool,
    pub draining: bool,
    pub auth_required: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Orchestrates replay of the queue against a [`RemoteGateway`].
pub struct SyncDispatcher<G: RemoteGateway> {
    store: Arc<DurableStore>,
    gateway: Arc<G>,
    connectivity: Arc<ConnectivityMonitor>,
    rejected_retry_limit: u32,
    draining: AtomicBool,
    abandoned: AtomicBool,
    auth_blocked: AtomicBool,
    signals: broadcast::Sender<SyncSignal>,
}

/// Clears the draining flag when a drain ends, however it ends.
struct DrainGuard<'a, G: RemoteGateway> {
    dispatcher: &'a SyncDispatcher<G>,
}

impl<G: RemoteGateway> Drop for DrainGuard<'_, G> {
    fn drop(&mut self) {
        self.dispatcher.abandoned.store(false, Ordering::Release);
        self.dispatcher.draining.store(false, Ordering::Release);
        self.dispatcher.emit(SyncSignal::Draining(false));
    }
}

impl<G: RemoteGateway> SyncDispatcher<G> {
    pub fn new(
        store: Arc<DurableStore>,
        gateway: Arc<G>,
        connectivity: Arc<ConnectivityMonitor>,
        rejected_retry_limit: u32,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        SyncDispatcher {
            store,
            gateway,
            connectivity,
            rejected_retry_limit: rejected_retry_limit.max(1),
            draining: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
            auth_blocked: AtomicBool::new(false),
            signals,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncSignal> {
        self.signals.subscribe()
    }

    fn emit(&self, signal: SyncSignal) {
        let _ = self.signals.send(signal);
    }

    fn emit_pending(&self) {
        match self.store.pending_count() {
            Ok(pending) => self.emit(SyncSignal::PendingCount(pending)),
            Err(e) => warn!(error = %e, "failed to count pending items"),
        }
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// True after an unauthorized halt, until the session changes.
    pub fn is_auth_blocked(&self) -> bool {
        self.auth_blocked.load(Ordering::Acquire)
    }

    pub fn status(&self) -> Result<SyncStatus> {
        Ok(SyncStatus {
            pending: self.store.pending_count()?,
            dead_letters: self.store.list_dead_letters()?.len(),
            online: self.connectivity.is_online(),
            draining: self.is_draining(),
            auth_required: self.is_auth_blocked(),
            last_sync_at: self.store.last_sync_at()?,
        })
    }

    /// Durably queues an action. Replay is triggered by the store event
    /// (see [`run`](Self::run)) or by an explicit [`drain`](Self::drain).
    pub fn enqueue(&self, action: &Action) -> Result<ItemId> {
        let id = self.store.enqueue(action)?;
        self.emit_pending();
        Ok(id)
    }

    /// Stops the current drain before its next item. A call already in
    /// flight completes and its outcome is still applied.
    pub fn abandon(&self) {
        if self.is_draining() {
            info!("abandoning drain");
            self.abandoned.store(true, Ordering::Release);
        }
    }

    /// The session changed; a blocked dispatcher may drain again.
    pub fn session_changed(&self) {
        if self.auth_blocked.swap(false, Ordering::AcqRel) {
            info!("session changed, replay unblocked");
        }
    }

    /// Runs one drain.
    ///
    /// Returns `None` without touching the queue when offline, blocked on
    /// authentication, or when another drain is already running.
    pub async fn drain(&self) -> Result<Option<DrainReport>> {
        if !self.connectivity.is_online() {
            debug!("offline, not draining");
            return Ok(None);
        }
        if self.is_auth_blocked() {
            debug!("waiting for authentication, not draining");
            return Ok(None);
        }
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("drain already running");
            return Ok(None);
        }
        let _guard = DrainGuard { dispatcher: self };
        self.emit(SyncSignal::Draining(true));

        let snapshot = self.store.list_pending()?;
        info!(items = snapshot.len(), "drain started");

        let mut report = DrainReport::default();
        for item in snapshot {
            if self.abandoned.swap(false, Ordering::AcqRel) {
                report.halted = Some(HaltReason::Abandoned);
                break;
            }
            if let Some(reason) = self.replay(&item.in_flight(), &mut report).await? {
                report.halted = Some(reason);
                break;
            }
        }

        match &report.halted {
            None => {
                if self.store.pending_count()? == 0 {
                    self.store.set_last_sync_at(Utc::now())?;
                }
                info!(
                    delivered = report.delivered,
                    discarded = report.discarded,
                    "drain finished"
                );
            }
            Some(reason) => warn!(
                delivered = report.delivered,
                discarded = report.discarded,
                ?reason,
                "drain halted"
            ),
        }
        Ok(Some(report))
    }

    /// Replays one item. Returns the halt reason if the drain must stop.
    async fn replay(
        &self,
        item: &QueueItem,
        report: &mut DrainReport,
    ) -> Result<Option<HaltReason>> {
        let call = match encode(&item.action_type, &item.payload) {
            Ok(call) => call,
            Err(e) if e.is_unprocessable() => {
                self.discard(item.id, &e.to_string())?;
                report.discarded += 1;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        debug!(
            id = item.id,
            action_type = %item.action_type,
            path = %call.path,
            "replaying item"
        );
        match self.gateway.execute(&call).await {
            Ok(()) => {
                self.store.remove(item.id)?;
                report.delivered += 1;
                self.emit_pending();
                Ok(None)
            }
            Err(TransportError::Transient(message)) => {
                let retry_count = self.store.record_failure(item.id)?;
                warn!(id = item.id, retry_count, %message, "transient failure");
                Ok(Some(HaltReason::Transient {
                    id: item.id,
                    message,
                }))
            }
            Err(TransportError::Unauthorized) => {
                warn!(id = item.id, "unauthorized, authentication required");
                self.auth_blocked.store(true, Ordering::Release);
                self.emit(SyncSignal::AuthenticationRequired);
                Ok(Some(HaltReason::Unauthorized { id: item.id }))
            }
            Err(TransportError::Rejected { status, body }) => {
                let rejections = self.store.record_rejection(item.id)?;
                if rejections >= self.rejected_retry_limit {
                    let reason = format!(
                        "rejected with status {status} after {rejections} attempts: {body}"
                    );
                    self.discard(item.id, &reason)?;
                    report.discarded += 1;
                    return Ok(None);
                }
                warn!(id = item.id, status, rejections, %body, "rejected");
                Ok(Some(HaltReason::Rejected {
                    id: item.id,
                    status,
                    rejections,
                }))
            }
        }
    }

    fn discard(&self, id: ItemId, reason: &str) -> Result<()> {
        warn!(id, reason, "quarantining undeliverable item");
        self.store.dead_letter(id, reason)?;
        self.emit(SyncSignal::Discarded {
            id,
            reason: reason.to_string(),
        });
        self.emit_pending();
        Ok(())
    }

    /// Drains, logging instead of propagating failures.
    async fn drain_logged(&self) {
        if let Err(e) = self.drain().await {
            warn!(error = %e, "drain failed");
        }
    }

    /// Event loop: drains on enqueue while online, on the transition to
    /// online, and when a new session arrives.
    ///
    /// Subscribes once to store events and connectivity. When `cancel`
    /// fires during a drain, the drain is abandoned between items and the
    /// loop exits after it returns.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut events = self.store.subscribe();
        let mut online = self.connectivity.subscribe();
        info!(online = self.connectivity.is_online(), "dispatcher started");

        // Anything left from a previous run.
        let mut pending_trigger = true;
        loop {
            if pending_trigger && self.connectivity.is_online() {
                if self.store.pending_count().is_ok_and(|n| n > 0) {
                    let drain = self.drain_logged();
                    tokio::pin!(drain);
                    tokio::select! {
                        _ = &mut drain => {}
                        _ = cancel.cancelled() => {
                            self.abandon();
                            drain.await;
                            break;
                        }
                    }
                }
            }
            pending_trigger = false;

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = online.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now_online = *online.borrow_and_update();
                    self.emit(SyncSignal::Online(now_online));
                    pending_trigger = now_online;
                }
                event = events.recv() => match event {
                    Ok(event) => pending_trigger = self.handle_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "store events lagged");
                        pending_trigger = true;
                    }
                    Err(RecvError::Closed) => break,
                },
            }

            // Coalesce a burst of events into one trigger.
            loop {
                match events.try_recv() {
                    Ok(event) => pending_trigger |= self.handle_event(&event),
                    Err(broadcast::error::TryRecvError::Lagged(_)) => pending_trigger = true,
                    Err(_) => break,
                }
            }
        }
        info!("dispatcher stopped");
    }

    /// Returns true if the event should trigger a drain.
    fn handle_event(&self, event: &StoreEvent) -> bool {
        match event {
            StoreEvent::QueueChanged {
                change: QueueChange::Enqueued(_),
                pending,
            } => {
                self.emit(SyncSignal::PendingCount(*pending));
                true
            }
            StoreEvent::QueueChanged { .. } => false,
            StoreEvent::SessionChanged { present: true } => {
                self.session_changed();
                true
            }
            StoreEvent::SessionChanged { present: false } => {
                self.abandon();
                false
            }
            StoreEvent::CacheChanged { .. } => false,
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
