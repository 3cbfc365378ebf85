//! Remote Tool Gateway
//!
//! Bridge to an external tool-hosting server over a persistent session.
//! Each configured server yields one gateway; the tools it advertises are
//! wrapped into [`GatewayTool`] registry entries whose invocation delegates
//! back to the gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::context::ToolContext;
use crate::tool::{Tool, ToolError, ToolSpec};

/// Separator between server name and tool name in composite registrations
pub const COMPOSITE_SEPARATOR: char = ':';

/// Gateway failure surface
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport or handshake failure while establishing the session
    #[error("connection failed: {0}")]
    Connection(String),

    /// Operation attempted before a successful connect
    #[error("gateway not connected")]
    NotConnected,

    /// Peer sent something the wire protocol does not allow
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Remote side reported the invocation failed
    #[error("remote invocation failed: {0}")]
    Invocation(String),
}

/// A tool advertised by a remote server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteToolInfo {
    /// Bare name on the remote server, without the composite prefix
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Argument schema as advertised
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Gateway client trait (one instance per configured remote server)
///
/// Implement this for each tool-hosting protocol a server might speak.
#[async_trait]
pub trait ToolGateway: Send + Sync {
    /// Server name, used to prefix the tools it contributes
    fn name(&self) -> &str;

    /// Establish the session; must succeed before any other operation
    async fn connect(&self) -> std::result::Result<(), GatewayError>;

    /// The server's advertised tool set, empty when none
    async fn list_tools(&self) -> std::result::Result<Vec<RemoteToolInfo>, GatewayError>;

    /// Invoke a remote tool by its bare name
    async fn call_tool(
        &self,
        tool: &str,
        arguments: Value,
    ) -> std::result::Result<Value, GatewayError>;

    /// Release the session; safe to call repeatedly or before connect
    async fn close(&self);
}

/// Registry entry delegating invocation to a remote gateway
///
/// Registered under the composite `server:tool` name so same-named tools
/// from different servers (or static tools) cannot collide. Invocation
/// forwards the bare name to the originating gateway.
pub struct GatewayTool {
    gateway: Arc<dyn ToolGateway>,
    info: RemoteToolInfo,
}

impl GatewayTool {
    pub fn new(gateway: Arc<dyn ToolGateway>, info: RemoteToolInfo) -> Self {
        Self { gateway, info }
    }

    /// Composite name this tool registers under
    pub fn composite_name(&self) -> String {
        format!(
            "{}{}{}",
            self.gateway.name(),
            COMPOSITE_SEPARATOR,
            self.info.name
        )
    }
}

#[async_trait]
impl Tool for GatewayTool {
    fn spec(&self) -> ToolSpec {
        let mut spec = ToolSpec::new(
            self.composite_name(),
            self.info.description.clone().unwrap_or_default(),
        );
        if let Some(schema) = self.info.input_schema.clone() {
            spec = spec.with_parameters(schema);
        }
        spec
    }

    async fn invoke(
        &self,
        arguments: Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<Value, ToolError> {
        let result = self.gateway.call_tool(&self.info.name, arguments).await?;
        flatten_remote_result(result)
    }
}

/// Collapse a structured remote result into transcript-ready form
///
/// Results shaped as content-block lists (`{"content": [{"type": "text",
/// "text": ...}], "isError": bool}`) flatten to their joined text, and the
/// error flag becomes a [`ToolError`]. Any other shape passes through for
/// the control loop to serialize as-is.
fn flatten_remote_result(result: Value) -> std::result::Result<Value, ToolError> {
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let flattened = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|blocks| {
            let texts: Vec<&str> = blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect();
            if texts.len() == blocks.len() {
                Some(texts.join("\n"))
            } else {
                None
            }
        });

    if is_error {
        let detail = match flattened {
            Some(text) if !text.is_empty() => text,
            _ => result.to_string(),
        };
        return Err(ToolError::Failed(detail));
    }

    match flattened {
        Some(text) => Ok(Value::String(text)),
        None => Ok(result),
    }
}
