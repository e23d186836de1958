// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    storage = { Error::StorageUnavailable("disk I/O error".into()), "disk I/O error" },
    unknown_type = { Error::UnknownActionType("TELEPORT".into()), "TELEPORT" },
    not_found = { Error::ItemNotFound(42), "42" },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[parameterized(
    unknown_type = { Error::UnknownActionType("X".into()), true },
    invalid_payload = { Error::InvalidPayload { action_type: "COMPLETE_ORDER".into(), reason: "missing orderId".into() }, true },
    storage = { Error::StorageUnavailable("locked".into()), false },
    not_found = { Error::ItemNotFound(1), false },
)]
fn error_is_unprocessable(err: Error, expected: bool) {
    assert_eq!(err.is_unprocessable(), expected);
}

#[test]
fn error_from_rusqlite_is_storage_unavailable() {
    let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, Error::StorageUnavailable(_)));
}

#[test]
fn corrupted_data_reports_storage_unavailable() {
    let err = Error::corrupted("bad payload in row 3");
    assert!(err.to_string().starts_with("storage unavailable: corrupted data"));
}
