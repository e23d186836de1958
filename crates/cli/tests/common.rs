// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `courier` pointed at an isolated state directory.
///
/// The API URL points at a port nothing listens on, so even commands run
/// without `--offline` never reach a real backend.
pub fn courier(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("courier");
    cmd.env("COURIER_STATE_DIR", state.path())
        .env("COURIER_API_URL", "http://127.0.0.1:9/api")
        .env_remove("RUST_LOG");
    cmd
}

/// Queue an action while offline and assert it was accepted.
pub fn queue_offline(state: &TempDir, args: &[&str]) {
    courier(state)
        .arg("--offline")
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued"));
}

/// Pending queue as JSON rows.
pub fn pending(state: &TempDir) -> Vec<serde_json::Value> {
    let output = courier(state)
        .args(["queue", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}
