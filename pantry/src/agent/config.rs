//! Agent configuration types.
//!
//! An [`Agent`] bundles a name, a system prompt, a chat model handle
//! and an ordered tool list. It holds no execution state; [`Agent::run`]
//! hands it to the [`Runner`](super::Runner).

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::chat::SharedChatProvider;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::tool::{BoxedTool, ToolDefinition};

use super::result::RunResult;
use super::runner::Runner;

/// A tool-using conversational agent bound to one chat model handle.
pub struct Agent {
    pub(crate) name: String,
    pub(crate) system_prompt: String,
    pub(crate) provider: SharedChatProvider,
    pub(crate) tools: Vec<BoxedTool>,
    pub(crate) max_steps: usize,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("system_prompt", &self.system_prompt)
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.default_model())
            .field("tools", &self.tool_names())
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl Agent {
    /// Default agent name.
    pub const DEFAULT_NAME: &'static str = "agent";

    /// Default maximum number of reasoning steps.
    pub const DEFAULT_MAX_STEPS: usize = 10;

    /// Create a new agent with the given name and model handle.
    #[must_use]
    pub fn new(name: impl Into<String>, provider: SharedChatProvider) -> Self {
        Self {
            name: name.into(),
            system_prompt: String::new(),
            provider,
            tools: Vec::new(),
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }

    /// Set the system prompt.
    #[must_use]
    pub fn instructions(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Add a tool to this agent.
    #[must_use]
    pub fn tool(mut self, tool: BoxedTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set all tools for this agent.
    #[must_use]
    pub fn tools(mut self, tools: Vec<BoxedTool>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the maximum number of reasoning steps.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Returns the agent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the chat model handle this agent is bound to.
    #[must_use]
    pub const fn provider(&self) -> &SharedChatProvider {
        &self.provider
    }

    /// Returns the registered tools, in registration order.
    #[must_use]
    pub fn tool_list(&self) -> &[BoxedTool] {
        &self.tools
    }

    /// Returns the tool names, in registration order.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Returns the step limit.
    #[must_use]
    pub const fn step_limit(&self) -> usize {
        self.max_steps
    }

    /// Returns the system prompt. Empty means none is sent.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub(crate) fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run the agent on a single user input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaxSteps`] if the model keeps requesting tools past
    /// the step limit, or propagates the model call error unchanged.
    pub async fn run(&self, input: impl Into<String>) -> Result<RunResult> {
        Runner::run(self, vec![Message::user(input)]).await
    }

    /// Run the agent on an existing conversation (system message excluded),
    /// e.g. [`RunResult::messages`] plus a new user turn.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_conversation(&self, messages: Vec<Message>) -> Result<RunResult> {
        Runner::run(self, messages).await
    }
}

/// Everything needed to construct an [`Agent`].
#[derive(Debug)]
pub struct AgentRequest {
    /// Chat model handle the agent will use.
    pub model: SharedChatProvider,
    /// Tools, in the order the model should see them.
    pub tools: Vec<BoxedTool>,
    /// System instruction.
    pub system_prompt: Option<String>,
    /// Agent name; defaults to [`Agent::DEFAULT_NAME`].
    pub name: Option<String>,
    /// Step limit; defaults to [`Agent::DEFAULT_MAX_STEPS`].
    pub max_steps: Option<usize>,
}

impl AgentRequest {
    /// Create a request for an agent on the given model with no tools.
    #[must_use]
    pub const fn new(model: SharedChatProvider) -> Self {
        Self {
            model,
            tools: Vec::new(),
            system_prompt: None,
            name: None,
            max_steps: None,
        }
    }

    /// Set the tools.
    #[must_use]
    pub fn tools(mut self, tools: Vec<BoxedTool>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Build an agent from a construction request.
///
/// # Errors
///
/// Returns [`Error::Agent`] when two tools share a name or the step limit
/// is zero.
pub fn create_agent(request: AgentRequest) -> Result<Agent> {
    let mut seen = HashSet::new();
    for tool in &request.tools {
        if !seen.insert(tool.name()) {
            return Err(Error::agent(format!("duplicate tool name '{}'", tool.name())));
        }
    }

    if request.max_steps == Some(0) {
        return Err(Error::agent("max_steps must be at least 1"));
    }

    let name = request
        .name
        .unwrap_or_else(|| Agent::DEFAULT_NAME.to_owned());
    let mut agent = Agent::new(name, request.model).tools(request.tools);
    if let Some(prompt) = request.system_prompt {
        agent = agent.instructions(prompt);
    }
    if let Some(max_steps) = request.max_steps {
        agent = agent.max_steps(max_steps);
    }

    debug!(
        agent = %agent.name,
        model = %agent.provider.default_model(),
        tools = ?agent.tool_names(),
        "Agent created"
    );
    Ok(agent)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ToolError;
    use crate::llms::MockProvider;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Named(&'static str);

    #[async_trait]
    impl crate::tool::DynTool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.0, "test", json!({"type": "object"}))
        }

        async fn call_json(&self, _args: Value) -> std::result::Result<Value, ToolError> {
            Ok(Value::Null)
        }
    }

    struct Noop;

    #[async_trait]
    impl Tool for Noop {
        const NAME: &'static str = "noop";
        type Args = Value;
        type Output = ();
        type Error = ToolError;

        fn description(&self) -> String {
            "Does nothing.".into()
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, _args: Value) -> std::result::Result<(), ToolError> {
            Ok(())
        }
    }

    fn model() -> SharedChatProvider {
        Arc::new(MockProvider::new(Vec::new()))
    }

    #[test]
    fn create_agent_applies_defaults() {
        let agent = create_agent(AgentRequest::new(model())).unwrap();
        assert_eq!(agent.name(), "agent");
        assert_eq!(agent.step_limit(), Agent::DEFAULT_MAX_STEPS);
        assert!(agent.system_prompt().is_empty());
        assert!(agent.tool_list().is_empty());
    }

    #[test]
    fn create_agent_keeps_model_handle() {
        let handle = model();
        let agent = create_agent(
            AgentRequest::new(Arc::clone(&handle))
                .tools(vec![Box::new(Noop)])
                .system_prompt("p"),
        )
        .unwrap();
        assert!(Arc::ptr_eq(agent.provider(), &handle));
        assert_eq!(agent.tool_names(), vec!["noop"]);
        assert_eq!(agent.system_prompt(), "p");
    }

    #[test]
    fn create_agent_rejects_duplicate_tools() {
        let request =
            AgentRequest::new(model()).tools(vec![Box::new(Named("dup")), Box::new(Named("dup"))]);
        let err = create_agent(request).unwrap_err();
        assert!(matches!(err, Error::Agent(msg) if msg.contains("dup")));
    }

    #[test]
    fn create_agent_rejects_zero_steps() {
        let mut request = AgentRequest::new(model());
        request.max_steps = Some(0);
        assert!(matches!(create_agent(request), Err(Error::Agent(_))));
    }

    #[test]
    fn debug_shows_prompt_and_tools() {
        let agent = Agent::new("chef", model())
            .instructions("You are a chef.")
            .tool(Box::new(Noop));
        let rendered = format!("{agent:?}");
        assert!(rendered.contains("You are a chef."));
        assert!(rendered.contains("noop"));
        assert!(rendered.contains("mock-model"));
    }
}
