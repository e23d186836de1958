// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use cr_core::Action;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn sync_offline_leaves_queue() {
    let t = TestContext::offline();
    t.ctx.store.enqueue(&Action::complete_task("T1")).unwrap();

    assert!(sync_impl(&t.ctx).await.unwrap().is_none());
    assert_eq!(t.ctx.store.pending_count().unwrap(), 1);
}

#[tokio::test]
async fn sync_replays_in_order_and_records_last_sync() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let t = TestContext::online(&server.uri()).logged_in();
    t.ctx
        .store
        .enqueue(&Action::status_update("S1", "ARRIVED"))
        .unwrap();
    t.ctx
        .store
        .enqueue(&Action::complete_order("O1", None))
        .unwrap();

    let report = sync_impl(&t.ctx).await.unwrap().unwrap();

    assert_eq!(report.delivered, 2);
    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(paths, ["/driver/status", "/orders/O1/complete"]);
    assert!(t.ctx.store.last_sync_at().unwrap().is_some());
}

#[tokio::test]
async fn sync_unauthorized_is_an_error_with_auth_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks/complete"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let t = TestContext::online(&server.uri()).logged_in();
    t.ctx.store.enqueue(&Action::complete_task("T1")).unwrap();

    let err = sync_impl(&t.ctx).await.unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert_eq!(t.ctx.store.pending_count().unwrap(), 1);
    assert!(t.ctx.dispatcher.is_auth_blocked());
}

#[tokio::test]
async fn sync_transient_failure_keeps_item_and_counts_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let t = TestContext::online(&server.uri()).logged_in();
    let id = t.ctx.store.enqueue(&Action::complete_task("T1")).unwrap();

    let report = sync_impl(&t.ctx).await.unwrap().unwrap();

    assert!(matches!(report.halted, Some(HaltReason::Transient { .. })));
    assert_eq!(t.ctx.store.get(id).unwrap().unwrap().retry_count, 1);
}

#[test]
fn second_watch_lock_is_refused() {
    let dir = TempDir::new().unwrap();
    let lock = lock_path(dir.path());

    let _held = acquire_lock(&lock).unwrap();
    let err = acquire_lock(&lock).unwrap_err();

    assert!(matches!(err, Error::AlreadyRunning(_)));
}
