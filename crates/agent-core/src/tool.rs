//! Tool System
//!
//! Tools are registered into a per-run registry and invoked by the control
//! loop when the model requests them. A tool is anything implementing the
//! [`Tool`] capability trait: locally supplied handlers and gateway-backed
//! remote delegates dispatch through the same call site.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::context::ToolContext;
use crate::error::{AgentError, Result};
use crate::gateway::GatewayError;

/// Name length cap applied when specs are surfaced to the model
pub const MAX_NAME_LEN: usize = 64;

/// Description length cap applied when specs are surfaced to the model
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Tool specification presented to the model
///
/// The name/description/schema triple the model sees when deciding whether
/// to invoke a tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// JSON Schema for the arguments object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    /// Attach an argument schema
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// The API-facing form: name and description capped, schema defaulted
    /// to an open object when the tool declared none.
    pub fn surfaced(&self) -> Self {
        Self {
            name: truncate(&self.name, MAX_NAME_LEN),
            description: truncate(&self.description, MAX_DESCRIPTION_LEN),
            parameters: Some(
                self.parameters
                    .clone()
                    .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
            ),
        }
    }
}

fn truncate(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        text.to_owned()
    } else {
        text.chars().take(cap).collect()
    }
}

/// Recoverable failure raised by a tool handler
///
/// These never abort a run. The control loop converts them into error-marked
/// `tool` messages so the model can see the failure and adapt.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments parsed but made no sense to the handler
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Handler ran and failed
    #[error("{0}")]
    Failed(String),

    /// Remote invocation through a gateway failed
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// The spec presented to the model
    fn spec(&self) -> ToolSpec;

    /// Invoke with parsed arguments and a logging-only context
    ///
    /// Returns the result value: a string is carried into the transcript
    /// verbatim, any other value is serialized to JSON text.
    async fn invoke(
        &self,
        arguments: Value,
        ctx: &ToolContext,
    ) -> std::result::Result<Value, ToolError>;
}

/// Registry for available tools
///
/// Built once per run, discarded when the run ends. Registration is the only
/// mutation; lookups never fail the run.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, taking ownership
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    ///
    /// Rejects tools without a non-empty name. Re-registering a name is
    /// last-wins: the previous entry is replaced and a warning logged.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.spec().name;
        if name.trim().is_empty() {
            return Err(AgentError::InvalidTool(
                "tool name must be non-empty".into(),
            ));
        }
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "replacing previously registered tool");
        }
        Ok(())
    }

    /// Look up a tool by name
    ///
    /// Absence is a normal outcome, reported to the model as a `tool`
    /// message by the control loop.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All specs in API-facing form
    ///
    /// Iteration order follows the map, not registration order.
    pub fn to_specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec().surfaced()).collect()
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// DateTime tool - returns current time
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("datetime", "Get the current date and time").with_parameters(json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Output format",
                    "enum": ["iso", "human", "unix"],
                },
            },
        }))
    }

    async fn invoke(
        &self,
        arguments: Value,
        _ctx: &ToolContext,
    ) -> std::result::Result<Value, ToolError> {
        let format = arguments
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("human");

        let now = chrono::Utc::now();
        let output = match format {
            "iso" => now.to_rfc3339(),
            "unix" => now.timestamp().to_string(),
            _ => now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string(),
        };

        Ok(Value::String(output))
    }
}
