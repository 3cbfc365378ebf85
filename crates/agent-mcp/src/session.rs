//! SSE Session Plumbing
//!
//! One session per connected server. A long-lived GET stream carries the
//! server's JSON-RPC frames; client requests go out as HTTP POSTs to the
//! endpoint the server announces in its first event. A reader task routes
//! each response frame to the request awaiting it by id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use serde_json::{json, Value};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use url::Url;

use agent_core::gateway::GatewayError;

use crate::endpoint::McpEndpoint;

/// MCP protocol revision spoken by this client
pub const PROTOCOL_VERSION: &str = "2025-06-18";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Value, GatewayError>>>>>;

/// An established session with one MCP server
pub struct SseSession {
    client: reqwest::Client,
    post_url: Url,
    pending: PendingMap,
    id_counter: AtomicU64,
    reader: JoinHandle<()>,
}

impl SseSession {
    /// Open the stream, wait for the endpoint announcement, then run the
    /// initialize handshake.
    pub async fn establish(endpoint: &McpEndpoint) -> Result<Self, GatewayError> {
        let headers = build_headers(&endpoint.headers)?;

        // No global timeout on this client: it owns the long-lived stream.
        // POSTs get a per-request timeout instead.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        let base = Url::parse(&endpoint.url).map_err(|e| {
            GatewayError::Connection(format!("invalid server url {}: {e}", endpoint.url))
        })?;

        let mut stream = client
            .get(base.clone())
            .eventsource()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        let post_url = tokio::time::timeout(
            HANDSHAKE_TIMEOUT,
            wait_for_endpoint(&mut stream, &base),
        )
        .await
        .map_err(|_| {
            GatewayError::Connection("timed out waiting for endpoint announcement".into())
        })??;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(reader_loop(stream, pending.clone()));

        let session = Self {
            client,
            post_url,
            pending,
            id_counter: AtomicU64::new(0),
            reader,
        };
        if let Err(err) = session.initialize(endpoint).await {
            session.shutdown().await;
            return Err(err);
        }
        Ok(session)
    }

    async fn initialize(&self, endpoint: &McpEndpoint) -> Result<(), GatewayError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {},
        });
        let result = self.request("initialize", params).await?;
        let negotiated = result
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        tracing::debug!(server = %endpoint.name, protocol = %negotiated, "session initialized");

        self.notify("notifications/initialized").await
    }

    /// Send a request and await its response frame
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = format!("req-{}", self.id_counter.fetch_add(1, Ordering::SeqCst) + 1);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        if let Err(err) = self.post(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(GatewayError::Connection(
                "session closed while awaiting response".into(),
            )),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(GatewayError::Connection(format!(
                    "timed out awaiting response to {method}"
                )))
            }
        }
    }

    /// Fire a notification; no response frame expected
    pub async fn notify(&self, method: &str) -> Result<(), GatewayError> {
        self.post(&json!({ "jsonrpc": "2.0", "method": method })).await
    }

    async fn post(&self, payload: &Value) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.post_url.clone())
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Protocol(format!(
                "unexpected status {} posting to session endpoint",
                response.status()
            )));
        }
        Ok(())
    }

    /// Abort the reader task and fail anything still pending
    pub async fn shutdown(self) {
        self.reader.abort();
        fail_all_pending(&self.pending, "session shut down").await;
    }
}

/// First event must announce where to POST; everything else is premature
async fn wait_for_endpoint(stream: &mut EventSource, base: &Url) -> Result<Url, GatewayError> {
    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Open) => {}
            Ok(Event::Message(message)) if message.event == "endpoint" => {
                return resolve_endpoint(base, &message.data);
            }
            Ok(Event::Message(message)) => {
                tracing::debug!(event = %message.event, "ignoring pre-endpoint event");
            }
            Err(err) => return Err(GatewayError::Connection(err.to_string())),
        }
    }
    Err(GatewayError::Connection(
        "stream closed before endpoint announcement".into(),
    ))
}

/// The announced endpoint may be a relative path or a full URL
fn resolve_endpoint(base: &Url, announced: &str) -> Result<Url, GatewayError> {
    base.join(announced.trim())
        .map_err(|e| GatewayError::Protocol(format!("bad endpoint announcement: {e}")))
}

async fn reader_loop(mut stream: EventSource, pending: PendingMap) {
    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Open) => {}
            Ok(Event::Message(message)) if message.event == "message" => {
                route_frame(&message.data, &pending).await;
            }
            Ok(Event::Message(message)) => {
                tracing::debug!(event = %message.event, "ignoring unexpected event");
            }
            Err(err) => {
                tracing::warn!(error = %err, "event stream failed");
                stream.close();
                break;
            }
        }
    }
    fail_all_pending(&pending, "event stream closed").await;
}

/// Match a JSON-RPC frame to the request awaiting it
///
/// Frames without one of our ids (server notifications, requests the server
/// initiates) are logged and dropped; this client only awaits responses.
async fn route_frame(data: &str, pending: &PendingMap) {
    let frame: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "discarding unparseable frame");
            return;
        }
    };

    let Some(id) = frame.get("id").and_then(Value::as_str).map(ToOwned::to_owned) else {
        tracing::debug!("ignoring frame without a request id");
        return;
    };

    let Some(sender) = pending.lock().await.remove(&id) else {
        tracing::debug!(id = %id, "no pending request for frame");
        return;
    };

    let outcome = if let Some(error) = frame.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        Err(GatewayError::Invocation(format!("rpc error {code}: {message}")))
    } else {
        Ok(frame.get("result").cloned().unwrap_or(Value::Null))
    };

    // Receiver may have timed out already; nothing to do then.
    let _ = sender.send(outcome);
}

async fn fail_all_pending(pending: &PendingMap, reason: &str) {
    let mut map = pending.lock().await;
    for (_, sender) in map.drain() {
        let _ = sender.send(Err(GatewayError::Connection(reason.into())));
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, GatewayError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| GatewayError::Connection(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| GatewayError::Connection(format!("invalid header value: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}
