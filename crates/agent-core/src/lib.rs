//! # agent-core
//!
//! Turn-based tool-calling control loop with provider-agnostic LLM
//! abstraction and a per-run tool registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Agent                                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │   Control   │  │    Tool     │  │    LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │──│    (Strategy)        │  │
//! │  └──────┬──────┘  └─────────────┘  └──────────────────────┘  │
//! │         │         ┌─────────────┐                            │
//! │         └─────────│ ToolGateway │── remote tool servers      │
//! │                   └─────────────┘                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each run builds a fresh registry from statically supplied tools plus the
//! tools discovered through its gateways, then alternates model calls and
//! sequential tool dispatch until the model answers in plain text or the
//! turn guardrail trips. The `LlmProvider` trait enables swapping between
//! any OpenAI-compatible backend (or a test fake) without touching the loop.

pub mod agent;
pub mod context;
pub mod error;
pub mod gateway;
pub mod message;
pub mod provider;
pub mod tool;

pub use agent::{Agent, AgentBuilder, AgentConfig, RunOutcome, GUARDRAIL_REPLY};
pub use context::{RunLogger, ToolContext};
pub use error::{AgentError, Result};
pub use gateway::{GatewayError, GatewayTool, RemoteToolInfo, ToolGateway};
pub use message::{coerce_text, FunctionCall, Message, Role, ToolCallRequest, Transcript};
pub use provider::{GenerationOptions, LlmProvider};
pub use tool::{DateTimeTool, Tool, ToolError, ToolRegistry, ToolSpec};
