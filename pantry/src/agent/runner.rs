//! Agent execution loop.
//!
//! The [`Runner`] drives an [`Agent`] through its tool-calling loop:
//!
//! 1. Prepend the system prompt to the conversation
//! 2. Call the model with the agent's tool definitions
//! 3. If the reply requests tools, execute them in order and append each
//!    result as a `tool` message, then go back to 2
//! 4. Otherwise the reply text is the final answer
//!
//! Tool failures never abort the run. They are reported to the model as
//! `Error: ...` tool messages so it can recover.

use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::chat::ChatRequest;
use crate::error::{Error, Result, ToolError};
use crate::message::{Message, ToolCall};
use crate::usage::Usage;

use super::config::Agent;
use super::result::RunResult;

/// Stateless executor for [`Agent`] runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner;

impl Runner {
    /// Run `agent` over `conversation` until the model answers without
    /// requesting tools.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaxSteps`] if the step limit is exceeded, or
    /// propagates the model call error unchanged.
    pub async fn run(agent: &Agent, conversation: Vec<Message>) -> Result<RunResult> {
        let span = info_span!(
            "agent.run",
            agent.name = %agent.name,
            agent.model = %agent.provider.default_model(),
            agent.max_steps = agent.max_steps,
            agent.tools = agent.tools.len(),
            agent.result_steps = tracing::field::Empty,
        );
        Self::run_inner(agent, conversation).instrument(span).await
    }

    async fn run_inner(agent: &Agent, conversation: Vec<Message>) -> Result<RunResult> {
        let system_prompt = agent.system_prompt();
        let definitions = agent.tool_definitions();
        let mut messages = conversation;
        let mut usage = Usage::zero();

        for step in 1..=agent.max_steps {
            debug!(agent = %agent.name, step, "Starting step");

            let mut request_messages = Vec::with_capacity(messages.len() + 1);
            if !system_prompt.is_empty() {
                request_messages.push(Message::system(system_prompt));
            }
            request_messages.extend(messages.iter().cloned());

            let request =
                ChatRequest::with_messages(agent.provider.default_model(), request_messages)
                    .tools(definitions.clone());

            let response = agent.provider.chat(&request).await.map_err(|e| {
                error!(error = %e, agent = %agent.name, step, "LLM call failed");
                e
            })?;

            if let Some(step_usage) = response.usage {
                usage += step_usage;
            }

            let tool_calls = response.tool_calls().map(<[_]>::to_vec).unwrap_or_default();
            if tool_calls.is_empty() {
                let output = response.text().unwrap_or_default();
                messages.push(response.message);

                tracing::Span::current().record("agent.result_steps", step);
                info!(
                    agent = %agent.name,
                    steps = step,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "Agent run completed"
                );

                return Ok(RunResult {
                    output,
                    usage,
                    steps: step,
                    messages,
                });
            }

            messages.push(response.message);
            for call in &tool_calls {
                let content = Self::execute_tool(agent, call).await;
                messages.push(Message::tool(&call.id, content));
            }
        }

        let err = Error::max_steps(agent.max_steps);
        error!(agent = %agent.name, max_steps = agent.max_steps, "Max steps exceeded");
        Err(err)
    }

    /// Execute one tool call and render its outcome as tool message content.
    async fn execute_tool(agent: &Agent, call: &ToolCall) -> String {
        let tool_span = info_span!(
            "tool",
            tool.name = %call.name(),
            tool.id = %call.id,
            tool.success = tracing::field::Empty,
        );

        async {
            let outcome = match agent.tools.iter().find(|t| t.name() == call.name()) {
                Some(tool) => match call.arguments_json() {
                    Ok(args) => tool.call_json(args).await,
                    Err(e) => Err(ToolError::from(e)),
                },
                None => Err(ToolError::not_found(call.name())),
            };

            tracing::Span::current().record("tool.success", outcome.is_ok());
            match outcome {
                Ok(Value::String(text)) => text,
                Ok(value) => value.to_string(),
                Err(e) => {
                    warn!(tool = %call.name(), error = %e, "Tool execution failed");
                    format!("Error: {e}")
                }
            }
        }
        .instrument(tool_span)
        .await
    }
}
