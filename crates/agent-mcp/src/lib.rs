//! # Agent MCP
//!
//! Model Context Protocol client for the agent stack. Connects to remote
//! tool servers over SSE, speaks JSON-RPC 2.0, and exposes each server as a
//! [`ToolGateway`](agent_core::gateway::ToolGateway) the control loop can
//! register tools from.
//!
//! ```no_run
//! use agent_mcp::{McpEndpoint, McpGateway};
//!
//! let endpoint = McpEndpoint::new("search", "http://localhost:8080/sse")
//!     .with_bearer("secret-token");
//! let gateway = McpGateway::new(endpoint);
//! ```

pub mod endpoint;
pub mod gateway;
pub mod session;

pub use endpoint::McpEndpoint;
pub use gateway::McpGateway;
pub use session::PROTOCOL_VERSION;
