// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Logical driver actions captured while on the road.
//!
//! An [`Action`] is what a producer hands to the queue: a tag identifying
//! which remote operation it stands for and an opaque JSON payload.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Which remote operation a queued action represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Mark a route task as done.
    CompleteTask,
    /// Driver status at a stop (arrived, departed, ...).
    StatusUpdate,
    /// Order completion carrying proof of delivery.
    CompleteOrder,
    /// Package scan with geolocation and anomaly metadata.
    ScanEvent,
    /// Photo captured for an order.
    PhotoUpload,
}

impl ActionType {
    /// Returns the tag used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CompleteTask => "COMPLETE_TASK",
            ActionType::StatusUpdate => "STATUS_UPDATE",
            ActionType::CompleteOrder => "COMPLETE_ORDER",
            ActionType::ScanEvent => "SCAN_EVENT",
            ActionType::PhotoUpload => "PHOTO_UPLOAD",
        }
    }

    /// Payload fields that identify one occurrence of this action.
    ///
    /// Two payloads agreeing on these fields describe the same real-world
    /// event, so they share an idempotency key.
    pub fn identity_fields(&self) -> &'static [&'static str] {
        match self {
            ActionType::CompleteTask => &["taskId"],
            ActionType::StatusUpdate => &["stopId", "status", "timestamp"],
            ActionType::CompleteOrder => &["orderId"],
            ActionType::ScanEvent => &["assetId", "scanType", "timestamp"],
            ActionType::PhotoUpload => &["orderId", "image"],
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "COMPLETE_TASK" => Ok(ActionType::CompleteTask),
            // Older driver builds queued status changes as UPDATE_STATUS.
            "STATUS_UPDATE" | "UPDATE_STATUS" => Ok(ActionType::StatusUpdate),
            "COMPLETE_ORDER" => Ok(ActionType::CompleteOrder),
            "SCAN_EVENT" => Ok(ActionType::ScanEvent),
            "PHOTO_UPLOAD" => Ok(ActionType::PhotoUpload),
            _ => Err(Error::UnknownActionType(s.to_string())),
        }
    }
}

/// Geolocated scan captured by the package scanner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReading {
    pub asset_id: String,
    pub scan_type: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accuracy: Option<f64>,
    pub distance: Option<f64>,
    pub anomaly: Option<String>,
}

/// A logical action waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub payload: Value,
}

impl Action {
    /// Creates an action from a type and a raw payload.
    pub fn new(action_type: ActionType, payload: Value) -> Self {
        Action {
            action_type,
            payload,
        }
    }

    pub fn complete_task(task_id: &str) -> Self {
        Action::new(
            ActionType::CompleteTask,
            json!({ "taskId": task_id, "timestamp": now_rfc3339() }),
        )
    }

    pub fn status_update(stop_id: &str, status: &str) -> Self {
        Action::new(
            ActionType::StatusUpdate,
            json!({ "stopId": stop_id, "status": status, "timestamp": now_rfc3339() }),
        )
    }

    /// Order completion. `proof` is attached verbatim as `proofData`.
    pub fn complete_order(order_id: &str, proof: Option<Value>) -> Self {
        let mut payload = Map::new();
        payload.insert("orderId".into(), Value::from(order_id));
        if let Some(proof) = proof {
            payload.insert("proofData".into(), proof);
        }
        payload.insert("timestamp".into(), Value::from(now_rfc3339()));
        Action::new(ActionType::CompleteOrder, Value::Object(payload))
    }

    pub fn scan_event(reading: &ScanReading) -> Self {
        Action::new(
            ActionType::ScanEvent,
            json!({
                "assetId": reading.asset_id,
                "scanType": reading.scan_type,
                "lat": reading.lat,
                "lon": reading.lon,
                "distance": reading.distance,
                "anomaly": reading.anomaly,
                "metadata": {
                    "accuracy": reading.accuracy,
                    "distance": reading.distance,
                },
                "timestamp": now_rfc3339(),
            }),
        )
    }

    /// Photo for an order; `image_base64` is the encoded file content.
    pub fn photo_upload(order_id: &str, file_name: &str, image_base64: String) -> Self {
        Action::new(
            ActionType::PhotoUpload,
            json!({
                "orderId": order_id,
                "fileName": file_name,
                "image": image_base64,
                "timestamp": now_rfc3339(),
            }),
        )
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
