//! LLM Provider Strategy Pattern
//!
//! Common interface for completion backends. The control loop works
//! exclusively through this trait, so any OpenAI-compatible service (or a
//! test fake) can drive it without loop changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{LlmProvider, GenerationOptions};
//!
//! let reply = provider.complete(transcript.messages(), &specs, &options).await?;
//! if !reply.has_tool_calls() {
//!     // final answer
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolSpec;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o-mini")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add a new completion backend. The loop makes one
/// call per turn: the full transcript and the current tool specs go in, the
/// assistant's next message comes out with any tool invocation requests
/// attached.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate the next assistant message
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        options: &GenerationOptions,
    ) -> Result<Message>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, 0.2);
        assert_eq!(opts.max_tokens, None);
        assert!(opts.model.is_empty());
    }
}
