// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote gateway abstraction for the backend API.
//!
//! Provides a trait-based call layer that enables:
//! - Real HTTP calls for production ([`HttpGateway`])
//! - Scripted gateways for unit testing

use base64::Engine;
use chrono::Duration as TtlDuration;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use cr_core::{CallDescriptor, DurableStore, Method, Session};

/// Header carrying the deterministic idempotency key of a replayed action.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Session lifetime when the backend does not say otherwise.
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// Classified failure of one remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// 401, or no usable session. Not the action's fault; never retried
    /// until the driver authenticates again.
    #[error("unauthorized\n  hint: run 'courier login request <identifier>' to sign in again")]
    Unauthorized,

    /// Network error, timeout, or 5xx. Retried on the next drain.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Any other 4xx. Retried up to a bound, then quarantined.
    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Result type for gateway operations.
pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    /// Maps an HTTP status to a failure class. `None` for success.
    pub fn from_status(status: u16, body: impl Into<String>) -> Option<Self> {
        match status {
            200..=299 => None,
            401 => Some(TransportError::Unauthorized),
            400..=499 => Some(TransportError::Rejected {
                status,
                body: body.into(),
            }),
            500..=599 => Some(TransportError::Transient(format!(
                "server error {status}: {}",
                body.into()
            ))),
            _ => Some(TransportError::Transient(format!("unexpected status {status}"))),
        }
    }

    fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Transient("request timed out".to_string())
        } else if e.is_connect() {
            TransportError::Transient(format!("connection failed: {e}"))
        } else {
            TransportError::Transient(e.to_string())
        }
    }
}

/// Executes encoded action calls against the backend.
///
/// This trait abstracts over the HTTP client so the dispatcher can be
/// driven by a scripted gateway in tests.
pub trait RemoteGateway: Send + Sync {
    /// Performs one call. Success means the backend accepted the action.
    fn execute<'a>(
        &'a self,
        call: &'a CallDescriptor,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + 'a>>;
}

/// Response of the magic-link exchange endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkGrant {
    pub access_token: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl MagicLinkGrant {
    /// Builds the session this grant authorizes.
    ///
    /// Missing fields are read from the token's JWT claims (`sub`, `exp`)
    /// when it has them.
    pub fn into_session(self) -> Session {
        let claims = jwt_claims(&self.access_token);
        let driver_id = self
            .driver_id
            .or_else(|| claim_string(claims.as_ref(), &["driverId", "sub"]))
            .unwrap_or_else(|| "driver".to_string());
        let ttl = self
            .expires_in
            .map(TtlDuration::seconds)
            .or_else(|| {
                let exp = claims.as_ref()?.get("exp")?.as_i64()?;
                Some(TtlDuration::seconds(exp - chrono::Utc::now().timestamp()))
            })
            .unwrap_or_else(|| TtlDuration::hours(DEFAULT_SESSION_TTL_HOURS));
        let route_id = self
            .route_id
            .or_else(|| claim_string(claims.as_ref(), &["routeId"]));

        let session = Session::new(driver_id, self.access_token, ttl);
        match route_id {
            Some(route) => session.with_route(route),
            None => session,
        }
    }
}

/// Decodes the payload segment of a JWT without verifying it.
fn jwt_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn claim_string(claims: Option<&Value>, keys: &[&str]) -> Option<String> {
    let claims = claims?;
    keys.iter().find_map(|key| match claims.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// HTTP gateway built on `reqwest`.
///
/// Reads the session from the store on every call, so a login or logout
/// takes effect for the next call without rebuilding the gateway.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    store: Arc<DurableStore>,
}

impl HttpGateway {
    /// Creates a gateway for `base_url`. `timeout` bounds each call.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<DurableStore>,
    ) -> crate::error::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| crate::error::Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    /// Base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> TransportResult<Url> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| TransportError::Transient(format!("invalid url for {path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Bearer token of the current session. A missing or expired session
    /// short-circuits to [`TransportError::Unauthorized`].
    fn bearer(&self) -> TransportResult<String> {
        match self.store.get_session() {
            Ok(Some(session)) => Ok(session.token),
            Ok(None) => Err(TransportError::Unauthorized),
            Err(e) => Err(TransportError::Transient(e.to_string())),
        }
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> TransportResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;
        debug!(path, status = status.as_u16(), "remote call finished");

        match TransportError::from_status(status.as_u16(), truncate(&body)) {
            None => Ok(body),
            Some(err) => Err(err),
        }
    }

    /// Authenticated GET returning the JSON body.
    pub async fn fetch_json(&self, path: &str, query: &[(&str, &str)]) -> TransportResult<Value> {
        let token = self.bearer()?;
        let request = self
            .client
            .get(self.url_with_query(path, query)?)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        let body = self.send(request, path).await?;
        parse_body(&body)
    }

    /// Asks the backend to send a login link to `identifier` (phone or
    /// email). Returns the backend's response as-is.
    pub async fn request_magic_link(&self, identifier: &str) -> TransportResult<Value> {
        let path = "/auth/magic-link/driver/generate";
        let request = self
            .client
            .post(self.url_with_query(path, &[("identifier", identifier)])?);
        let body = self.send(request, path).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        parse_body(&body)
    }

    /// Trades a magic-link token for an access token.
    pub async fn exchange_magic_link(&self, token: &str) -> TransportResult<MagicLinkGrant> {
        let path = "/auth/magic-link/exchange";
        let request = self
            .client
            .post(self.url_with_query(path, &[("token", token)])?);
        let body = self.send(request, path).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Rejected {
            status: StatusCode::OK.as_u16(),
            body: format!("malformed grant: {e}"),
        })
    }
}

impl RemoteGateway for HttpGateway {
    fn execute<'a>(
        &'a self,
        call: &'a CallDescriptor,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let token = self.bearer()?;
            let url = self.url(&call.path);
            let mut request = match call.method {
                Method::Get => self.client.get(url),
                Method::Post => self.client.post(url),
            };
            request = request
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(IDEMPOTENCY_HEADER, &call.idempotency_key);
            if let Some(body) = &call.body {
                request = request.json(body);
            }
            self.send(request, &call.path).await.map(|_| ())
        })
    }
}

fn parse_body(body: &str) -> TransportResult<Value> {
    serde_json::from_str(body).map_err(|e| TransportError::Rejected {
        status: StatusCode::OK.as_u16(),
        body: format!("response is not JSON: {e}"),
    })
}

fn truncate(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
