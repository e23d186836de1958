// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

#[test]
fn offline_actions_are_queued_in_order() {
    let state = TempDir::new().unwrap();

    queue_offline(&state, &["update-status", "S1", "ARRIVED"]);
    queue_offline(&state, &["complete-order", "O1"]);

    let rows = pending(&state);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "STATUS_UPDATE");
    assert_eq!(rows[0]["payload"]["stopId"], "S1");
    assert_eq!(rows[1]["type"], "COMPLETE_ORDER");
    assert_eq!(rows[1]["payload"]["orderId"], "O1");
}

#[test]
fn offline_submit_says_it_will_replay() {
    let state = TempDir::new().unwrap();

    courier(&state)
        .args(["--offline", "complete-task", "T1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued COMPLETE_TASK #1"))
        .stdout(predicate::str::contains("Offline"));
}

#[test]
fn queue_survives_between_invocations() {
    let state = TempDir::new().unwrap();

    queue_offline(&state, &["complete-task", "T1"]);
    queue_offline(&state, &["scan", "PKG-1", "--lat", "52.2", "--lon", "21.0"]);

    courier(&state)
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("taskId=T1"))
        .stdout(predicate::str::contains("assetId=PKG-1"));
}

#[test]
fn raw_enqueue_accepts_typed_payload() {
    let state = TempDir::new().unwrap();

    queue_offline(
        &state,
        &["enqueue", "COMPLETE_TASK", r#"{"taskId":"T9"}"#],
    );

    assert_eq!(pending(&state)[0]["payload"]["taskId"], "T9");
}

#[test]
fn raw_enqueue_rejects_unknown_type() {
    let state = TempDir::new().unwrap();

    courier(&state)
        .args(["--offline", "enqueue", "CANCEL_ORDER", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown action type"))
        .stderr(predicate::str::contains("hint:"));

    assert!(pending(&state).is_empty());
}

#[test]
fn raw_enqueue_rejects_invalid_json() {
    let state = TempDir::new().unwrap();

    courier(&state)
        .args(["--offline", "enqueue", "COMPLETE_TASK", "{nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON for payload"));
}

#[test]
fn photo_of_missing_file_fails() {
    let state = TempDir::new().unwrap();

    courier(&state)
        .args(["--offline", "photo", "O1", "/nonexistent/photo.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn photo_is_queued_base64() {
    let state = TempDir::new().unwrap();
    let photo = state.path().join("proof.jpg");
    std::fs::write(&photo, b"hello").unwrap();

    queue_offline(&state, &["photo", "O1", photo.to_str().unwrap()]);

    let rows = pending(&state);
    assert_eq!(rows[0]["type"], "PHOTO_UPLOAD");
    assert_eq!(rows[0]["payload"]["image"], "aGVsbG8=");
    assert_eq!(rows[0]["payload"]["fileName"], "proof.jpg");
}
