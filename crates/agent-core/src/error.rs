//! Error Types

use thiserror::Error;

use crate::gateway::GatewayError;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Run-fatal agent errors
///
/// Per-tool-call failures are deliberately absent here: they are folded into
/// the transcript as `tool` messages so the model can react to them. See
/// [`crate::tool::ToolError`] for that surface.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid construction parameter
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool rejected at registration time
    #[error("Invalid tool: {0}")]
    InvalidTool(String),

    /// Transport-level failure reaching the completion endpoint
    #[error("Provider error: {0}")]
    Provider(String),

    /// Non-success response from the completion endpoint
    #[error("Model error (status {status}): {body}")]
    Model { status: u16, body: String },

    /// Completion endpoint returned a payload the client cannot use
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// Remote tool gateway failure during discovery
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Run aborted through its cancellation token
    #[error("Run cancelled")]
    Cancelled,

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
