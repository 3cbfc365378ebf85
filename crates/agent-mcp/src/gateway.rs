//! MCP Gateway
//!
//! [`ToolGateway`] implementation backed by an [`SseSession`]. Connecting is
//! idempotent; closing tears the session down and fails any in-flight call.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use agent_core::gateway::{GatewayError, RemoteToolInfo, ToolGateway};

use crate::endpoint::McpEndpoint;
use crate::session::SseSession;

/// A remote tool server reached over SSE + JSON-RPC
pub struct McpGateway {
    endpoint: McpEndpoint,
    session: Mutex<Option<SseSession>>,
}

impl McpGateway {
    pub fn new(endpoint: McpEndpoint) -> Self {
        Self {
            endpoint,
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ToolGateway for McpGateway {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn connect(&self) -> Result<(), GatewayError> {
        let mut guard = self.session.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let session = SseSession::establish(&self.endpoint).await?;
        tracing::info!(server = %self.endpoint.name, "gateway connected");
        *guard = Some(session);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<RemoteToolInfo>, GatewayError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(GatewayError::NotConnected)?;
        let result = session.request("tools/list", json!({})).await?;
        parse_tool_list(&result)
    }

    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value, GatewayError> {
        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(GatewayError::NotConnected)?;
        session
            .request(
                "tools/call",
                json!({ "name": tool, "arguments": arguments }),
            )
            .await
    }

    async fn close(&self) {
        if let Some(session) = self.session.lock().await.take() {
            session.shutdown().await;
            tracing::debug!(server = %self.endpoint.name, "gateway closed");
        }
    }
}

fn parse_tool_list(result: &Value) -> Result<Vec<RemoteToolInfo>, GatewayError> {
    let Some(tools) = result.get("tools") else {
        return Ok(Vec::new());
    };
    serde_json::from_value(tools.clone())
        .map_err(|e| GatewayError::Protocol(format!("malformed tools list: {e}")))
}
