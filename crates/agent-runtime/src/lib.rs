//! # agent-runtime
//!
//! Runtime providers for the agent loop.
//!
//! ## Providers
//!
//! - **OpenAI-compatible**: the chat-completions API over HTTP. Any service
//!   speaking that wire format works; the base URL is the only difference.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let agent = Agent::builder()
//!     .provider(Arc::new(provider))
//!     .model("gpt-4o-mini")
//!     .build()?;
//! ```

pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentBuilder, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry,
};
