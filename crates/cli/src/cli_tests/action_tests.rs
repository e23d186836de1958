// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_complete_task() {
    let cli = parse(&["courier", "complete-task", "T1"]).unwrap();
    match cli.command {
        Command::CompleteTask { task_id } => assert_eq!(task_id, "T1"),
        _ => panic!("Expected CompleteTask command"),
    }
}

#[test]
fn test_update_status() {
    let cli = parse(&["courier", "update-status", "S1", "ARRIVED"]).unwrap();
    match cli.command {
        Command::UpdateStatus { stop_id, status } => {
            assert_eq!(stop_id, "S1");
            assert_eq!(status, "ARRIVED");
        }
        _ => panic!("Expected UpdateStatus command"),
    }
}

#[test]
fn test_complete_order_with_proof() {
    let cli = parse(&["courier", "complete-order", "O1", "--proof", "{\"sig\":1}"]).unwrap();
    match cli.command {
        Command::CompleteOrder { order_id, proof } => {
            assert_eq!(order_id, "O1");
            assert_eq!(proof.as_deref(), Some("{\"sig\":1}"));
        }
        _ => panic!("Expected CompleteOrder command"),
    }
}

#[test]
fn test_scan_with_negative_coordinates() {
    let cli = parse(&[
        "courier", "scan", "PKG-1", "--lat", "-33.86", "--lon", "-70.65", "--accuracy", "4.5",
    ])
    .unwrap();
    match cli.command {
        Command::Scan {
            asset_id,
            scan_type,
            reading,
        } => {
            let reading = reading.reading(&asset_id, &scan_type);
            assert_eq!(reading.asset_id, "PKG-1");
            assert_eq!(reading.scan_type, "DELIVERY_SUCCESS");
            assert_eq!(reading.lat, Some(-33.86));
            assert_eq!(reading.lon, Some(-70.65));
            assert_eq!(reading.accuracy, Some(4.5));
            assert_eq!(reading.anomaly, None);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn test_enqueue_raw() {
    let cli = parse(&["courier", "enqueue", "COMPLETE_TASK", "{\"taskId\":\"T1\"}"]).unwrap();
    match cli.command {
        Command::Enqueue {
            action_type,
            payload,
        } => {
            assert_eq!(action_type, "COMPLETE_TASK");
            assert_eq!(payload, "{\"taskId\":\"T1\"}");
        }
        _ => panic!("Expected Enqueue command"),
    }
}

#[parameterized(
    task_id = { &["courier", "complete-task", ""] },
    stop_id = { &["courier", "update-status", " ", "ARRIVED"] },
    order_id = { &["courier", "complete-order", ""] },
    asset_id = { &["courier", "scan", "  "] },
)]
fn test_empty_identifiers_rejected(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[parameterized(
    list = { &["courier", "queue", "list"], false },
    list_json = { &["courier", "queue", "list", "-o", "json"], true },
    failed_json = { &["courier", "queue", "failed", "--output", "json"], true },
)]
fn test_queue_output_format(args: &[&str], json: bool) {
    let cli = parse(args).unwrap();
    let output = match cli.command {
        Command::Queue(QueueCommand::List { output }) => output,
        Command::Queue(QueueCommand::Failed { output }) => output,
        _ => panic!("Expected Queue command"),
    };
    assert_eq!(output == OutputFormat::Json, json);
}

#[test]
fn test_purge_failed() {
    let cli = parse(&["courier", "queue", "purge-failed"]).unwrap();
    assert!(matches!(cli.command, Command::Queue(QueueCommand::PurgeFailed)));
}
