//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use pantry::prelude::*;
//! ```

pub use crate::agent::{Agent, AgentRequest, RunResult, Runner, create_agent};
pub use crate::chat::{
    ChatProvider, ChatProviderExt, ChatRequest, ChatResponse, SharedChatProvider, StopReason,
    ToolChoice,
};
pub use crate::config::ModelSettings;
pub use crate::error::{Error, LlmError, LlmErrorKind, Result, ToolError};
pub use crate::factory::{
    AgentOverrides, ClientFactory, ModelInitializer, ModelOverrides, ModelRequest,
    OpenAIInitializer,
};
pub use crate::llms::{MockProvider, OpenAI, OpenAIConfig};
pub use crate::message::{FunctionCall, Message, Role, ToolCall};
pub use crate::tool::{BoxedTool, DynTool, Tool, ToolDefinition, ToolResult};
pub use crate::tools::{SearchResponse, SearchResult, TavilyConfig, WebSearchTool};
pub use crate::usage::Usage;
