//! Conversation Messages
//!
//! Wire-shaped message format replayed to the completion API every turn.
//! Messages serialize to exactly what the endpoint expects, so the transcript
//! can be sent verbatim as the `messages` array.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result (injected as context)
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a conversation
///
/// `content` stays a raw [`Value`] rather than a `String`: assistant content
/// may arrive as a string, a list of content parts, or null, and it must be
/// replayed to the API unchanged. Use [`coerce_text`] to flatten it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Content as the API produced or expects it
    #[serde(default)]
    pub content: Value,

    /// Tool invocations requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Correlation id linking a tool message to the request it answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a new text message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Value::String(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a tool result message correlated to a tool call
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Attach tool invocation requests (assistant messages only)
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Whether this message requests any tool invocations
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// One tool invocation requested by the model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id echoed back in the answering tool message
    pub id: String,

    /// Call kind, `"function"` for every call this loop handles
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,

    /// The function the model wants invoked
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".into()
}

/// Requested function name plus its raw argument payload
///
/// `arguments` is the unparsed string the model emitted. Parsing happens at
/// dispatch time and parse failure is recoverable, so the raw form is kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl ToolCallRequest {
    /// Create a function call request
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Ordered, append-only message history
///
/// Order is significant: the whole transcript is the context replayed to the
/// model on every turn. Messages are never mutated or removed once pushed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the transcript, yielding the owned message list
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Flatten assistant content into plain text
///
/// Strings pass through as-is. Content-part arrays concatenate each part's
/// `text` field, with textless parts contributing nothing. A single object
/// with a `text` field yields that field, null yields the empty string, and
/// anything else is stringified.
pub fn coerce_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| part.get("text").and_then(Value::as_str).unwrap_or(""))
            .collect(),
        Value::Object(fields) => match fields.get("text").and_then(Value::as_str) {
            Some(text) => text.to_owned(),
            None => content.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, json!("Hello"));
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_wire_shape_has_no_extra_fields() {
        let user = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(user, json!({"role": "user", "content": "hi"}));

        let tool = serde_json::to_value(Message::tool("42", "call_1")).unwrap();
        assert_eq!(
            tool,
            json!({"role": "tool", "content": "42", "tool_call_id": "call_1"})
        );
    }

    #[test]
    fn test_assistant_tool_calls_roundtrip() {
        let msg = Message::assistant("").with_tool_calls(vec![ToolCallRequest::function(
            "call_1",
            "lookup",
            r#"{"q":"btc"}"#,
        )]);
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "lookup");

        let back: Message = serde_json::from_value(wire).unwrap();
        assert!(back.has_tool_calls());
        assert_eq!(back.tool_calls[0].id, "call_1");
        assert_eq!(back.tool_calls[0].function.arguments, r#"{"q":"btc"}"#);
    }

    #[test]
    fn test_transcript_appends_in_order() {
        let mut transcript = Transcript::new();
        transcript.push(Message::system("You are helpful."));
        transcript.push(Message::user("Hi"));
        transcript.push(Message::assistant("Hello!"));

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().unwrap().role, Role::Assistant);
        assert_eq!(transcript.messages()[0].role, Role::System);
    }

    #[test]
    fn test_coerce_text_variants() {
        assert_eq!(coerce_text(&json!("plain")), "plain");
        assert_eq!(
            coerce_text(&json!([
                {"type": "text", "text": "Hello, "},
                {"type": "image", "url": "x"},
                {"type": "text", "text": "world"}
            ])),
            "Hello, world"
        );
        assert_eq!(coerce_text(&json!({"text": "inner"})), "inner");
        assert_eq!(coerce_text(&Value::Null), "");
        assert_eq!(coerce_text(&json!(42)), "42");
        assert_eq!(coerce_text(&json!({"no_text": 1})), r#"{"no_text":1}"#);
    }
}
