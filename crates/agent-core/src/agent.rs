//! Control Loop
//!
//! The turn-based state machine at the center of the crate: send the
//! transcript to the model, read the assistant's reply, dispatch any
//! requested tool calls, fold the results back into the transcript, repeat
//! until the model answers in plain text or a guardrail trips.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::context::{RunLogger, ToolContext};
use crate::error::{AgentError, Result};
use crate::gateway::{GatewayTool, ToolGateway};
use crate::message::{coerce_text, Message, ToolCallRequest, Transcript};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolRegistry};

/// Fixed reply returned when the turn guardrail trips
///
/// Deliberately not an error: stopping a runaway loop is a designed outcome.
pub const GUARDRAIL_REPLY: &str =
    "Agent stopped: maximum turns reached without a final answer.";

/// Agent configuration
///
/// All guardrails are fixed here at construction and invariant for the life
/// of a run.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt; skipped when empty
    pub system_prompt: String,

    /// Turns allowed before the guardrail reply
    pub max_turns: usize,

    /// Tool calls honored per turn; excess requests are dropped, not queued
    pub max_tool_calls_per_turn: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Log run events at info instead of debug
    pub verbose: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            max_turns: 8,
            max_tool_calls_per_turn: 4,
            generation: GenerationOptions::default(),
            verbose: false,
        }
    }
}

/// Result of a finished run
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Final answer, or [`GUARDRAIL_REPLY`] when the turn limit was reached
    pub text: String,

    /// The full transcript, seeded prompts included
    pub messages: Vec<Message>,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    static_tools: Vec<Arc<dyn Tool>>,
    gateways: Vec<Arc<dyn ToolGateway>>,
    config: AgentConfig,
    cancellation: CancellationToken,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop on a user prompt
    ///
    /// Every configured gateway is released afterwards, on all exit paths:
    /// final answer, guardrail stop, failure, cancellation.
    pub async fn run(&self, prompt: &str) -> Result<RunOutcome> {
        let logger = RunLogger::new(self.config.verbose);
        let result = self.run_inner(prompt, &logger).await;
        for gateway in &self.gateways {
            gateway.close().await;
        }
        result
    }

    async fn run_inner(&self, prompt: &str, logger: &RunLogger) -> Result<RunOutcome> {
        let registry = self.build_registry().await?;
        if !registry.is_empty() {
            logger.note(&format!("tools available: {}", registry.names().join(", ")));
        }
        let specs = registry.to_specs();
        let ctx = ToolContext::new(logger.clone());

        let mut transcript = Transcript::new();
        if !self.config.system_prompt.is_empty() {
            transcript.push(Message::system(&self.config.system_prompt));
        }
        transcript.push(Message::user(prompt));

        for turn in 1..=self.config.max_turns {
            if self.cancellation.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            logger.turn_started(turn, self.config.max_turns);

            let reply = tokio::select! {
                biased;
                () = self.cancellation.cancelled() => return Err(AgentError::Cancelled),
                reply = self.provider.complete(
                    transcript.messages(),
                    &specs,
                    &self.config.generation,
                ) => reply?,
            };
            logger.assistant_received(reply.tool_calls.len());

            // Appended verbatim, dropped calls included: the transcript must
            // replay exactly what the model said.
            let content = reply.content.clone();
            let calls = reply.tool_calls.clone();
            transcript.push(reply);

            if calls.is_empty() {
                return Ok(RunOutcome {
                    text: coerce_text(&content),
                    messages: transcript.into_messages(),
                });
            }

            if calls.len() > self.config.max_tool_calls_per_turn {
                logger.calls_dropped(
                    calls.len() - self.config.max_tool_calls_per_turn,
                    self.config.max_tool_calls_per_turn,
                );
            }

            // Sequential on purpose: each result is appended before the next
            // call runs, so transcript order matches request order.
            for call in calls
                .into_iter()
                .take(self.config.max_tool_calls_per_turn)
            {
                let message = self.dispatch(&registry, call, &ctx, logger).await?;
                transcript.push(message);
            }
        }

        Ok(RunOutcome {
            text: GUARDRAIL_REPLY.into(),
            messages: transcript.into_messages(),
        })
    }

    /// Fresh registry for this run: static tools first, then each gateway's
    /// discovered tools under composite names. Discovery failure aborts the
    /// run; a partial registry would let the model call tools that silently
    /// never registered.
    async fn build_registry(&self) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in &self.static_tools {
            registry.register_arc(tool.clone())?;
        }
        for gateway in &self.gateways {
            gateway.connect().await?;
            let discovered = gateway.list_tools().await?;
            tracing::debug!(
                server = %gateway.name(),
                tools = discovered.len(),
                "discovered remote tools"
            );
            for info in discovered {
                registry.register_arc(Arc::new(GatewayTool::new(gateway.clone(), info)))?;
            }
        }
        Ok(registry)
    }

    /// One tool call: parse, resolve, invoke, render
    ///
    /// Every per-call failure ends up inside the returned `tool` message so
    /// the model can see it and adapt. Only cancellation escapes as an error.
    async fn dispatch(
        &self,
        registry: &ToolRegistry,
        call: ToolCallRequest,
        ctx: &ToolContext,
        logger: &RunLogger,
    ) -> Result<Message> {
        let name = call.function.name;
        let arguments = parse_arguments(&call.function.arguments);
        logger.tool_dispatched(&name, &call.id);

        let Some(tool) = registry.resolve(&name) else {
            logger.tool_failed(&name, "not found");
            return Ok(Message::tool(
                format!("Error: tool '{name}' not found"),
                call.id,
            ));
        };

        let outcome = tokio::select! {
            biased;
            () = self.cancellation.cancelled() => return Err(AgentError::Cancelled),
            outcome = tool.invoke(arguments, ctx) => outcome,
        };

        let content = match outcome {
            Ok(value) => render_result(&value),
            Err(err) => {
                logger.tool_failed(&name, &err.to_string());
                format!("Error: {err}")
            }
        };
        Ok(Message::tool(content, call.id))
    }
}

/// Parse model-supplied arguments
///
/// The model's argument string is untrusted input. An empty payload means no
/// arguments; anything unparseable degrades to a sentinel object carrying
/// the raw string, never a run failure.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "raw": raw }))
}

/// Serialize a tool result for the transcript
///
/// Strings are carried verbatim (no added quoting); any other value becomes
/// compact JSON text.
fn render_result(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    static_tools: Vec<Arc<dyn Tool>>,
    gateways: Vec<Arc<dyn ToolGateway>>,
    config: AgentConfig,
    cancellation: CancellationToken,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            static_tools: Vec::new(),
            gateways: Vec::new(),
            config: AgentConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add a statically supplied tool
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.static_tools.push(Arc::new(tool));
        self
    }

    /// Add a shared statically supplied tool
    pub fn tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.static_tools.push(tool);
        self
    }

    /// Add a remote tool gateway; its tools are discovered at run start
    pub fn gateway(mut self, gateway: Arc<dyn ToolGateway>) -> Self {
        self.gateways.push(gateway);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.config.generation.max_tokens = Some(max);
        self
    }

    pub fn max_turns(mut self, max: usize) -> Self {
        self.config.max_turns = max;
        self
    }

    pub fn max_tool_calls_per_turn(mut self, max: usize) -> Self {
        self.config.max_tool_calls_per_turn = max;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Token checked between turns and at both suspension points
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Validate and assemble the agent
    ///
    /// A provider and a model identifier are required; everything else has
    /// a default.
    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        if self.config.generation.model.trim().is_empty() {
            return Err(AgentError::Config("Model identifier is required".into()));
        }

        Ok(Agent {
            provider,
            static_tools: self.static_tools,
            gateways: self.gateways,
            config: self.config,
            cancellation: self.cancellation,
        })
    }
}
