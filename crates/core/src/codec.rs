// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a queued action onto the remote call that delivers it.
//!
//! Encoding is a pure function of `(action_type, payload)`. In particular the
//! idempotency key is derived only from the action tag and the payload's
//! identity fields, so replaying the same queue item after a crash produces
//! the same key and the backend can drop the duplicate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::action::ActionType;
use crate::error::{Error, Result};

/// HTTP method of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the gateway needs to perform one remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub method: Method,
    /// Path relative to the API base URL, always starting with `/`.
    pub path: String,
    pub body: Option<Value>,
    pub idempotency_key: String,
}

/// Encodes a stored action into a call descriptor.
///
/// Fails with [`Error::UnknownActionType`] for a tag this build does not know
/// and [`Error::InvalidPayload`] when a field the endpoint needs is missing.
/// Both are permanent: retrying cannot fix them.
pub fn encode(action_type: &str, payload: &Value) -> Result<CallDescriptor> {
    let kind: ActionType = action_type.parse()?;
    if !payload.is_object() {
        return Err(invalid(kind, "payload must be a JSON object"));
    }

    let path = match kind {
        ActionType::CompleteTask => {
            require(kind, payload, "taskId")?;
            "/tasks/complete".to_string()
        }
        ActionType::StatusUpdate => {
            require(kind, payload, "stopId")?;
            require(kind, payload, "status")?;
            "/driver/status".to_string()
        }
        ActionType::CompleteOrder => {
            let order_id = path_segment(kind, payload, "orderId")?;
            format!("/orders/{order_id}/complete")
        }
        ActionType::ScanEvent => {
            require(kind, payload, "assetId")?;
            "/scan-events".to_string()
        }
        ActionType::PhotoUpload => {
            require(kind, payload, "orderId")?;
            require(kind, payload, "image")?;
            "/vision/analyze".to_string()
        }
    };

    Ok(CallDescriptor {
        method: Method::Post,
        path,
        body: Some(payload.clone()),
        idempotency_key: idempotency_key(kind, payload),
    })
}

/// Deterministic key for one occurrence of an action.
///
/// Hex SHA-256 over the canonical tag and the canonical JSON of the identity
/// fields. Falls back to the whole payload when none are present.
pub fn idempotency_key(kind: ActionType, payload: &Value) -> String {
    let identity: Map<String, Value> = kind
        .identity_fields()
        .iter()
        .filter_map(|field| {
            payload
                .get(*field)
                .filter(|v| !v.is_null())
                .map(|v| ((*field).to_string(), v.clone()))
        })
        .collect();

    let mut canonical = String::new();
    if identity.is_empty() {
        write_canonical(payload, &mut canonical);
    } else {
        write_canonical(&Value::Object(identity), &mut canonical);
    }

    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Serializes with object keys sorted at every level, independent of how
/// the map was built.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

fn invalid(kind: ActionType, reason: impl Into<String>) -> Error {
    Error::InvalidPayload {
        action_type: kind.as_str().to_string(),
        reason: reason.into(),
    }
}

fn require<'a>(kind: ActionType, payload: &'a Value, field: &str) -> Result<&'a Value> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(invalid(kind, format!("missing {field}"))),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(invalid(kind, format!("{field} cannot be empty")))
        }
        Some(v) => Ok(v),
    }
}

/// Reads a field that is interpolated into the URL path.
fn path_segment(kind: ActionType, payload: &Value, field: &str) -> Result<String> {
    let segment = match require(kind, payload, field)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(invalid(kind, format!("{field} must be a string or number"))),
    };
    let safe = segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !safe {
        return Err(invalid(kind, format!("{field} '{segment}' is not a valid path segment")));
    }
    Ok(segment)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
