//! Remote Endpoint Descriptors

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Address plus connect-time auth headers for one MCP server
///
/// The name prefixes every tool the server contributes, so it must be
/// unique across the endpoints handed to one agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McpEndpoint {
    /// Server name used in composite tool names
    pub name: String,

    /// SSE URL of the server
    pub url: String,

    /// Extra headers sent when the session is established
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl McpEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header sent at connect time
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Bearer-token convenience for the `Authorization` header
    pub fn with_bearer(self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.with_header("Authorization", format!("Bearer {token}"))
    }
}
