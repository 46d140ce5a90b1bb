//! Chat types and the provider trait.
//!
//! This module provides:
//! - [`ChatRequest`]: Request parameters for chat completions
//! - [`ChatResponse`]: Response from chat completions
//! - [`ChatProvider`]: The trait every chat model client implements
//!
//! A [`SharedChatProvider`] is the "client handle" handed out by
//! [`ClientFactory::get_model`](crate::factory::ClientFactory::get_model).
//!
//! # Example
//!
//! ```rust,ignore
//! use pantry::prelude::*;
//!
//! let request = ChatRequest::new("gpt-4")
//!     .system("You are helpful.")
//!     .user("Hello!")
//!     .temperature(0.2);
//!
//! let response = provider.chat(&request).await?;
//! println!("{}", response.text().unwrap_or_default());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::message::{Message, ToolCall};
use crate::tool::ToolDefinition;
use crate::usage::Usage;

/// A chat completion request.
///
/// Sampling fields left as `None` fall back to whatever defaults the
/// provider handle was constructed with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier. Empty means "the provider's default model".
    #[serde(default)]
    pub model: String,

    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 to 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Tools available for the model to call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    /// Controls how the model uses tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

impl ChatRequest {
    /// Creates a new request with the specified model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Creates a request with messages.
    #[must_use]
    pub fn with_messages(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }

    /// Adds a system message.
    #[must_use]
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Adds a message.
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets max tokens.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets top_p.
    #[must_use]
    pub const fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets stop sequences.
    #[must_use]
    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Sets tools. An empty list clears them.
    #[must_use]
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = (!tools.is_empty()).then_some(tools);
        self
    }

    /// Sets tool choice.
    #[must_use]
    pub fn tool_choice(mut self, choice: impl Into<ToolChoice>) -> Self {
        self.tool_choice = Some(choice.into().to_value());
        self
    }
}

/// Controls how the model uses tools.
#[derive(Debug, Clone, Default)]
pub enum ToolChoice {
    /// Model decides whether to use tools.
    #[default]
    Auto,
    /// Model must use at least one tool.
    Required,
    /// Model cannot use any tools.
    None,
    /// Model must use the specified function.
    Function(String),
}

impl ToolChoice {
    /// Converts to the JSON value sent on the wire.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Auto => Value::String("auto".to_owned()),
            Self::Required => Value::String("required".to_owned()),
            Self::None => Value::String("none".to_owned()),
            Self::Function(name) => serde_json::json!({
                "type": "function",
                "function": {"name": name}
            }),
        }
    }
}

impl From<&str> for ToolChoice {
    fn from(s: &str) -> Self {
        match s {
            "auto" => Self::Auto,
            "required" => Self::Required,
            "none" => Self::None,
            name => Self::Function(name.to_owned()),
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural stop (end of response).
    #[default]
    Stop,
    /// Maximum token limit reached.
    Length,
    /// Model decided to call tools.
    ToolCalls,
    /// Content was filtered by safety systems.
    ContentFilter,
}

impl StopReason {
    /// Parse an OpenAI `finish_reason`; unknown values map to [`StopReason::Stop`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }
}

/// A chat completion response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message.
    pub message: Message,

    /// Why the model stopped generating.
    pub stop_reason: StopReason,

    /// Token usage statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model identifier used for this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Unique completion ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChatResponse {
    /// Creates a new response with a message.
    #[must_use]
    pub const fn new(message: Message) -> Self {
        Self {
            message,
            stop_reason: StopReason::Stop,
            usage: None,
            model: None,
            id: None,
        }
    }

    /// Creates a response from text content.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self::new(Message::assistant(content))
    }

    /// Creates a response that requests tool calls.
    #[must_use]
    pub fn from_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self::new(Message::assistant_tool_calls(calls)).with_stop_reason(StopReason::ToolCalls)
    }

    /// Sets the stop reason.
    #[must_use]
    pub const fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self
    }

    /// Sets usage statistics.
    #[must_use]
    pub const fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Returns the text content of the response.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.message.content.clone()
    }

    /// Returns `true` if the response contains tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        self.message.has_tool_calls()
    }

    /// Returns the tool calls if present.
    #[must_use]
    pub fn tool_calls(&self) -> Option<&[ToolCall]> {
        self.message.tool_calls.as_deref()
    }
}

/// Trait for chat model clients.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a chat completion request and receive a complete response.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Get the name of this provider, used in errors and logs.
    fn provider_name(&self) -> &'static str;

    /// Get the model this handle was configured with.
    fn default_model(&self) -> &str;
}

/// Convenience methods available on every [`ChatProvider`].
#[async_trait]
pub trait ChatProviderExt: ChatProvider {
    /// Send a single user prompt and get the text reply.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(self.default_model()).user(prompt);
        let response = self.chat(&request).await?;
        Ok(response.text().unwrap_or_default())
    }
}

impl<T: ChatProvider + ?Sized> ChatProviderExt for T {}

impl std::fmt::Debug for dyn ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.default_model())
            .finish()
    }
}

/// Type alias for an Arc-wrapped ChatProvider.
pub type SharedChatProvider = Arc<dyn ChatProvider>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::Role;

    mod chat_request {
        use super::*;

        #[test]
        fn builder_appends_messages_in_order() {
            let req = ChatRequest::new("gpt-4").system("sys").user("hi");
            assert_eq!(req.model, "gpt-4");
            assert_eq!(req.messages.len(), 2);
            assert_eq!(req.messages[0].role, Role::System);
            assert_eq!(req.messages[1].role, Role::User);
        }

        #[test]
        fn empty_tools_are_cleared() {
            let req = ChatRequest::new("m").tools(Vec::new());
            assert!(req.tools.is_none());
        }

        #[test]
        fn sampling_setters() {
            let req = ChatRequest::new("m").temperature(0.2).max_tokens(64).top_p(0.9);
            assert_eq!(req.temperature, Some(0.2));
            assert_eq!(req.max_tokens, Some(64));
            assert_eq!(req.top_p, Some(0.9));
        }
    }

    mod tool_choice {
        use super::*;

        #[test]
        fn from_str_variants() {
            assert!(matches!(ToolChoice::from("auto"), ToolChoice::Auto));
            assert!(matches!(ToolChoice::from("required"), ToolChoice::Required));
            assert!(matches!(ToolChoice::from("none"), ToolChoice::None));
            assert!(matches!(ToolChoice::from("web_search"), ToolChoice::Function(_)));
        }

        #[test]
        fn function_serializes_as_object() {
            let value = ToolChoice::Function("web_search".into()).to_value();
            assert_eq!(value["function"]["name"], "web_search");
        }
    }

    mod stop_reason {
        use super::*;

        #[test]
        fn parse_known_and_unknown() {
            assert_eq!(StopReason::parse("length"), StopReason::Length);
            assert_eq!(StopReason::parse("tool_calls"), StopReason::ToolCalls);
            assert_eq!(StopReason::parse("content_filter"), StopReason::ContentFilter);
            assert_eq!(StopReason::parse("whatever"), StopReason::Stop);
        }
    }

    mod chat_response {
        use super::*;

        #[test]
        fn tool_call_response() {
            let resp = ChatResponse::from_tool_calls(vec![ToolCall::function("c1", "f", "{}")]);
            assert!(resp.has_tool_calls());
            assert_eq!(resp.stop_reason, StopReason::ToolCalls);
            assert_eq!(resp.tool_calls().unwrap().len(), 1);
        }

        #[test]
        fn text_response() {
            let resp = ChatResponse::from_text("hello");
            assert_eq!(resp.text().as_deref(), Some("hello"));
            assert!(!resp.has_tool_calls());
        }
    }

    mod shared_provider {
        use super::*;
        use crate::agent::AgentRequest;
        use crate::llms::MockProvider;

        #[test]
        fn debug_shows_provider_and_model() {
            let handle: SharedChatProvider =
                Arc::new(MockProvider::new(Vec::new()).with_model("qwen-turbo"));
            let rendered = format!("{handle:?}");
            assert!(rendered.contains("mock"));
            assert!(rendered.contains("qwen-turbo"));
        }

        #[test]
        fn agent_request_debug_includes_model() {
            let handle: SharedChatProvider = Arc::new(MockProvider::new(Vec::new()));
            let rendered = format!("{:?}", AgentRequest::new(handle).system_prompt("p"));
            assert!(rendered.contains("mock-model"));
            assert!(rendered.contains("system_prompt"));
        }
    }
}
