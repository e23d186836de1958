// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Duration as TtlDuration;
use cr_core::{CallDescriptor, DurableStore, Session};

use super::connectivity::ConnectivityMonitor;
use super::dispatcher::SyncDispatcher;
use super::gateway::{RemoteGateway, TransportError, TransportResult};

/// Gateway that records every call and answers from a script.
///
/// Calls beyond the end of the script succeed.
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<VecDeque<TransportResult<()>>>,
    calls: Mutex<Vec<CallDescriptor>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call takes `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        MockGateway {
            delay,
            ..Self::default()
        }
    }

    /// Queue the answer for the next unanswered call.
    pub fn push(&self, result: TransportResult<()>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn push_transient(&self) {
        self.push(Err(TransportError::Transient("network down".into())));
    }

    pub fn push_rejected(&self, status: u16) {
        self.push(Err(TransportError::Rejected {
            status,
            body: "rejected".into(),
        }));
    }

    pub fn calls(&self) -> Vec<CallDescriptor> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of calls that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl RemoteGateway for MockGateway {
    fn execute<'a>(
        &'a self,
        call: &'a CallDescriptor,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(call.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let result = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// Store, gateway, connectivity, and dispatcher wired together.
pub struct Harness {
    pub store: Arc<DurableStore>,
    pub gateway: Arc<MockGateway>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub dispatcher: Arc<SyncDispatcher<MockGateway>>,
}

impl Harness {
    /// Logged-in harness with an undebounced connectivity monitor.
    pub fn new(online: bool) -> Self {
        Self::with_gateway(online, MockGateway::new(), 3)
    }

    pub fn with_gateway(online: bool, gateway: MockGateway, rejected_retry_limit: u32) -> Self {
        let store = Arc::new(DurableStore::open_in_memory().unwrap());
        store
            .put_session(&Session::new("D1", "tok", TtlDuration::hours(1)))
            .unwrap();
        let gateway = Arc::new(gateway);
        let connectivity = ConnectivityMonitor::fixed(online);
        let dispatcher = Arc::new(SyncDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            Arc::clone(&connectivity),
            rejected_retry_limit,
        ));
        Harness {
            store,
            gateway,
            connectivity,
            dispatcher,
        }
    }

    /// Ids of the pending items, in replay order.
    pub fn pending_ids(&self) -> Vec<cr_core::ItemId> {
        self.store
            .list_pending()
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect()
    }
}
