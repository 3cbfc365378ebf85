//! OpenAI-Compatible LLM Provider
//!
//! Implementation of `LlmProvider` for the chat-completions wire format.
//! Works against the public endpoint or any self-hosted service speaking
//! the same API; only the base URL changes.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{GenerationOptions, LlmProvider},
    tool::ToolSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default public endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Base URL; `/chat/completions` is appended per request
    pub base_url: String,

    /// Bearer credential sent in the `Authorization` header
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    /// Read `OPENAI_API_KEY` and optional `OPENAI_BASE_URL`
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        Self {
            base_url,
            api_key,
            ..Default::default()
        }
    }
}

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    ///
    /// The credential is validated here, not at first use: a missing key
    /// should fail the run before any turn starts.
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::Config("API credential is required".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create against the default public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(OpenAiConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env())
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Request body for the chat-completions endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolWrapper<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Wire wrapper the API expects around each tool spec
#[derive(Serialize)]
struct ToolWrapper<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSpec,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        options: &GenerationOptions,
    ) -> Result<Message> {
        let request = ChatRequest {
            model: &options.model,
            messages,
            tools: tools
                .iter()
                .map(|spec| ToolWrapper {
                    kind: "function",
                    function: spec,
                })
                .collect(),
            // "auto" only makes sense when tools are offered at all
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(
            model = %options.model,
            messages = messages.len(),
            tools = tools.len(),
            "requesting completion"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Model {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| AgentError::InvalidResponse("no assistant message in response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_for(server: &mockito::ServerGuard) -> OpenAiProvider {
        OpenAiProvider::from_config(OpenAiConfig {
            base_url: server.url(),
            api_key: "test-key".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn options() -> GenerationOptions {
        GenerationOptions {
            model: "test-model".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_missing_credential_rejected() {
        let err = OpenAiProvider::new("").err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let provider = OpenAiProvider::from_config(OpenAiConfig {
            base_url: "https://example.test/v1/".into(),
            api_key: "k".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            provider.completions_url(),
            "https://example.test/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_complete_sends_tools_and_parses_tool_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "test-model",
                "tool_choice": "auto",
                "temperature": 0.2,
                "tools": [{"type": "function", "function": {"name": "lookup"}}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {"name": "lookup", "arguments": "{\"q\":\"btc\"}"},
                            }],
                        },
                    }],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider_for(&server);
        let specs = vec![ToolSpec::new("lookup", "find things").surfaced()];
        let reply = provider
            .complete(&[Message::user("hi")], &specs, &options())
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(reply.has_tool_calls());
        assert_eq!(reply.tool_calls[0].id, "call_1");
        assert_eq!(reply.tool_calls[0].function.name, "lookup");
    }

    #[tokio::test]
    async fn test_plain_text_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider_for(&server);
        let reply = provider
            .complete(&[Message::user("hi")], &[], &options())
            .await
            .unwrap();

        assert!(!reply.has_tool_calls());
        assert_eq!(reply.content, json!("Hello!"));
    }

    #[tokio::test]
    async fn test_non_success_maps_to_model_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("hi")], &[], &options())
            .await
            .unwrap_err();

        match err {
            AgentError::Model { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected Model error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .complete(&[Message::user("hi")], &[], &options())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }
}
