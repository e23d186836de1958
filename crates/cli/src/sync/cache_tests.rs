// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::gateway::TransportError;
use cr_core::{KIND_ORDERS, KIND_TASKS};
use serde_json::json;

fn cache() -> (ReadThroughCache, Arc<DurableStore>) {
    let store = Arc::new(DurableStore::open_in_memory().unwrap());
    (ReadThroughCache::new(Arc::clone(&store)), store)
}

fn offline() -> TransportResult<Vec<Value>> {
    Err(TransportError::Transient("offline".into()))
}

#[tokio::test]
async fn live_fetch_is_returned_and_mirrored() {
    let (cache, store) = cache();
    let orders = vec![json!({ "id": "O1" }), json!({ "id": "O2" })];

    let read = cache
        .refresh(KIND_ORDERS, || async { Ok(orders.clone()) })
        .await
        .unwrap();

    assert_eq!(read, CacheRead::Live(orders.clone()));
    let mirrored: Vec<_> = store
        .get_cached_entities(KIND_ORDERS)
        .unwrap()
        .into_iter()
        .map(|e| e.data)
        .collect();
    assert_eq!(mirrored, orders);
}

#[tokio::test]
async fn failed_fetch_falls_back_to_mirror() {
    let (cache, _store) = cache();
    let orders = vec![json!({ "id": "O1", "status": "ASSIGNED" })];
    cache
        .refresh(KIND_ORDERS, || async { Ok(orders.clone()) })
        .await
        .unwrap();

    let read = cache
        .refresh(KIND_ORDERS, || async { offline() })
        .await
        .unwrap();

    assert!(matches!(read, CacheRead::Cached { .. }));
    assert_eq!(read.records(), orders.as_slice());
}

#[tokio::test]
async fn failed_fetch_without_mirror_is_no_data() {
    let (cache, _store) = cache();
    let read = cache
        .refresh(KIND_ORDERS, || async {
            Err(TransportError::Unauthorized)
        })
        .await
        .unwrap();
    assert_eq!(read, CacheRead::NoData);
    assert!(read.records().is_empty());
}

#[tokio::test]
async fn successful_fetch_replaces_mirror_wholesale() {
    let (cache, _store) = cache();
    cache
        .refresh(KIND_ORDERS, || async {
            Ok(vec![json!({ "id": "O1", "note": "old" }), json!({ "id": "O2" })])
        })
        .await
        .unwrap();
    cache
        .refresh(KIND_ORDERS, || async { Ok(vec![json!({ "id": "O1" })]) })
        .await
        .unwrap();

    let read = cache.cached(KIND_ORDERS).unwrap();
    assert_eq!(read.records(), &[json!({ "id": "O1" })]);
}

#[tokio::test]
async fn kinds_do_not_share_mirrors() {
    let (cache, _store) = cache();
    cache
        .refresh(KIND_TASKS, || async { Ok(vec![json!({ "id": 1 })]) })
        .await
        .unwrap();
    assert_eq!(cache.cached(KIND_ORDERS).unwrap(), CacheRead::NoData);
}

#[tokio::test]
async fn records_without_id_keep_their_order() {
    let (cache, _store) = cache();
    let records = vec![json!({ "name": "b" }), json!({ "name": "a" })];
    cache
        .refresh(KIND_TASKS, || async { Ok(records.clone()) })
        .await
        .unwrap();
    assert_eq!(cache.cached(KIND_TASKS).unwrap().records(), records.as_slice());
}

#[tokio::test]
async fn duplicate_ids_are_all_mirrored() {
    let (cache, store) = cache();
    let orders = vec![
        json!({ "id": "O1", "stop": 1 }),
        json!({ "id": "O1", "stop": 2 }),
        json!({ "note": "no id" }),
        json!({ "id": "#2" }),
    ];
    cache
        .refresh(KIND_ORDERS, || async { Ok(orders.clone()) })
        .await
        .unwrap();

    assert_eq!(store.get_cached_entities(KIND_ORDERS).unwrap().len(), 4);
    let read = cache.cached(KIND_ORDERS).unwrap();
    assert_eq!(read.records(), orders.as_slice());
}
