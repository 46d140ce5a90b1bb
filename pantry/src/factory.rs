//! Client factory: builds chat model and agent handles from [`ModelSettings`].
//!
//! The factory borrows the settings resolved once at startup and merges
//! caller-supplied typed overrides on top of them. Nothing is cached: every
//! [`ClientFactory::get_model`] call constructs a fresh handle.
//!
//! # Example
//!
//! ```rust,ignore
//! use pantry::prelude::*;
//!
//! let settings = ModelSettings::from_env();
//! let factory = ClientFactory::new(&settings);
//!
//! let model = factory.get_model(ModelOverrides::new().temperature(0.2))?;
//! let agent = factory.get_agent(
//!     AgentOverrides::new()
//!         .tool(Box::new(WebSearchTool::from_env()?))
//!         .system_prompt("You are a personal chef."),
//! )?;
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::agent::{Agent, AgentRequest, create_agent};
use crate::chat::SharedChatProvider;
use crate::config::ModelSettings;
use crate::error::{LlmError, Result};
use crate::llms::openai::{OpenAI, OpenAIConfig};
use crate::tool::BoxedTool;

/// Provider tag every request is seeded with.
pub const DEFAULT_MODEL_PROVIDER: &str = "openai";

/// A fully merged chat model construction request.
#[derive(Clone, Default, PartialEq)]
pub struct ModelRequest {
    /// Model identifier.
    pub model: String,
    /// Provider tag, e.g. `"openai"`.
    pub model_provider: String,
    /// Endpoint base URL. `None` means the provider default.
    pub base_url: Option<String>,
    /// API key. `None` means no credentials are sent.
    pub api_key: Option<String>,
    /// Default sampling temperature.
    pub temperature: Option<f32>,
    /// Default completion token limit.
    pub max_tokens: Option<u32>,
    /// Default nucleus sampling parameter.
    pub top_p: Option<f32>,
    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Organization ID.
    pub organization: Option<String>,
}

impl ModelRequest {
    /// Seed a request from settings: model name and provider tag, plus
    /// `base_url` and `api_key` only when they are set.
    #[must_use]
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            model: settings.model_name().to_owned(),
            model_provider: DEFAULT_MODEL_PROVIDER.to_owned(),
            base_url: settings.base_url().map(str::to_owned),
            api_key: settings.api_key().map(str::to_owned),
            ..Self::default()
        }
    }

    /// Apply overrides field by field. A set override always wins.
    #[must_use]
    pub fn merge(mut self, o: ModelOverrides) -> Self {
        if let Some(model) = o.model {
            self.model = model;
        }
        if let Some(provider) = o.model_provider {
            self.model_provider = provider;
        }
        self.base_url = o.base_url.or(self.base_url);
        self.api_key = o.api_key.or(self.api_key);
        self.temperature = o.temperature.or(self.temperature);
        self.max_tokens = o.max_tokens.or(self.max_tokens);
        self.top_p = o.top_p.or(self.top_p);
        self.timeout_secs = o.timeout_secs.or(self.timeout_secs);
        self.organization = o.organization.or(self.organization);
        self
    }

    /// Translate into an OpenAI client configuration.
    #[must_use]
    pub fn to_openai_config(&self) -> OpenAIConfig {
        let mut config = OpenAIConfig::new(&self.model);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(org) = &self.organization {
            config = config.with_organization(org);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(secs);
        }
        config.temperature = self.temperature;
        config.max_tokens = self.max_tokens;
        config.top_p = self.top_p;
        config
    }
}

impl fmt::Debug for ModelRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRequest")
            .field("model", &self.model)
            .field("model_provider", &self.model_provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .field("organization", &self.organization)
            .finish()
    }
}

/// Caller-supplied overrides for [`ClientFactory::get_model`].
///
/// Every field left `None` keeps the value derived from [`ModelSettings`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOverrides {
    /// Model identifier.
    pub model: Option<String>,
    /// Provider tag.
    pub model_provider: Option<String>,
    /// Endpoint base URL.
    pub base_url: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Completion token limit.
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,
    /// HTTP timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Organization ID.
    pub organization: Option<String>,
}

impl ModelOverrides {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the provider tag.
    #[must_use]
    pub fn model_provider(mut self, provider: impl Into<String>) -> Self {
        self.model_provider = Some(provider.into());
        self
    }

    /// Override the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set top_p.
    #[must_use]
    pub const fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the organization ID.
    #[must_use]
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }
}

/// Caller-supplied options for [`ClientFactory::get_agent`].
#[derive(Default)]
pub struct AgentOverrides {
    /// Existing model handle. `None` builds one from settings.
    pub model: Option<SharedChatProvider>,
    /// Tools, in registration order.
    pub tools: Vec<BoxedTool>,
    /// System instruction.
    pub system_prompt: Option<String>,
    /// Agent name.
    pub name: Option<String>,
    /// Step limit.
    pub max_steps: Option<usize>,
}

impl AgentOverrides {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing model handle instead of building a default one.
    #[must_use]
    pub fn model(mut self, model: SharedChatProvider) -> Self {
        self.model = Some(model);
        self
    }

    /// Add a tool.
    #[must_use]
    pub fn tool(mut self, tool: BoxedTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set all tools.
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

    /// Set the agent name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the step limit.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

impl fmt::Debug for AgentOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentOverrides")
            .field("model", &self.model.as_ref().map(|m| m.default_model()))
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("system_prompt", &self.system_prompt)
            .field("name", &self.name)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

/// Turns a [`ModelRequest`] into a chat model handle.
pub trait ModelInitializer: Send + Sync {
    /// Construct a chat model handle.
    fn init_chat_model(&self, request: ModelRequest) -> Result<SharedChatProvider>;
}

/// Default initializer: builds [`OpenAI`] clients for the `"openai"` tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIInitializer;

impl ModelInitializer for OpenAIInitializer {
    fn init_chat_model(&self, request: ModelRequest) -> Result<SharedChatProvider> {
        match request.model_provider.as_str() {
            DEFAULT_MODEL_PROVIDER => Ok(Arc::new(OpenAI::new(request.to_openai_config())?)),
            other => Err(LlmError::not_supported(format!("model provider '{other}'")).into()),
        }
    }
}

/// Builds model and agent handles from borrowed settings.
#[derive(Debug)]
pub struct ClientFactory<'a, I = OpenAIInitializer> {
    settings: &'a ModelSettings,
    initializer: I,
}

impl<'a> ClientFactory<'a> {
    /// Create a factory that builds OpenAI-compatible clients.
    #[must_use]
    pub const fn new(settings: &'a ModelSettings) -> Self {
        Self::with_initializer(settings, OpenAIInitializer)
    }
}

impl<'a, I: ModelInitializer> ClientFactory<'a, I> {
    /// Create a factory with a custom model initializer.
    #[must_use]
    pub const fn with_initializer(settings: &'a ModelSettings, initializer: I) -> Self {
        Self {
            settings,
            initializer,
        }
    }

    /// Returns the settings this factory reads from.
    #[must_use]
    pub const fn settings(&self) -> &ModelSettings {
        self.settings
    }

    /// Returns the model initializer.
    #[must_use]
    pub const fn initializer(&self) -> &I {
        &self.initializer
    }

    /// The configured model name, `"gpt-4"` when unset.
    #[must_use]
    pub fn get_model_name(&self) -> &str {
        self.settings.model_name()
    }

    /// The construction request [`get_model`](Self::get_model) would issue.
    #[must_use]
    pub fn model_request(&self, overrides: ModelOverrides) -> ModelRequest {
        ModelRequest::from_settings(self.settings).merge(overrides)
    }

    /// Build a new chat model handle.
    ///
    /// # Errors
    ///
    /// Propagates the initializer's error unchanged.
    pub fn get_model(&self, overrides: ModelOverrides) -> Result<SharedChatProvider> {
        let request = self.model_request(overrides);
        debug!(
            model = %request.model,
            provider = %request.model_provider,
            base_url = request.base_url.as_deref().unwrap_or("<default>"),
            has_api_key = request.api_key.is_some(),
            "Constructing chat model"
        );
        self.initializer.init_chat_model(request)
    }

    /// Build an agent. Without a model handle in `overrides`, exactly one
    /// default model is constructed first.
    ///
    /// # Errors
    ///
    /// Propagates model construction and agent construction errors unchanged.
    pub fn get_agent(&self, overrides: AgentOverrides) -> Result<Agent> {
        let model = match overrides.model {
            Some(model) => model,
            None => self.get_model(ModelOverrides::default())?,
        };

        create_agent(AgentRequest {
            model,
            tools: overrides.tools,
            system_prompt: overrides.system_prompt,
            name: overrides.name,
            max_steps: overrides.max_steps,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::error::{Error, LlmErrorKind, ToolError};
    use crate::llms::MockProvider;
    use crate::tool::Tool;

    /// Records every request and hands out one shared mock handle.
    struct Recording {
        calls: Mutex<Vec<ModelRequest>>,
        handle: SharedChatProvider,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                handle: Arc::new(MockProvider::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<ModelRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ModelInitializer for Recording {
        fn init_chat_model(&self, request: ModelRequest) -> Result<SharedChatProvider> {
            self.calls.lock().unwrap().push(request);
            Ok(Arc::clone(&self.handle))
        }
    }

    struct Failing;

    impl ModelInitializer for Failing {
        fn init_chat_model(&self, _request: ModelRequest) -> Result<SharedChatProvider> {
            Err(LlmError::auth("openai", "no key").into())
        }
    }

    struct Search;

    #[async_trait]
    impl Tool for Search {
        const NAME: &'static str = "web_search";
        type Args = Value;
        type Output = Value;
        type Error = ToolError;

        fn description(&self) -> String {
            "Search the web for information".into()
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn call(&self, args: Value) -> std::result::Result<Value, ToolError> {
            Ok(args)
        }
    }

    fn settings(vars: &[(&str, &str)]) -> ModelSettings {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ModelSettings::from_lookup(|key| env.get(key).cloned())
    }

    fn full_env() -> ModelSettings {
        settings(&[
            ("OPENAI_MODEL_NAME", "qwen-turbo"),
            ("OPENAI_BASE_URL", "https://x/v1"),
            ("OPENAI_API_KEY", "abc"),
        ])
    }

    mod model_name {
        use super::*;

        #[test]
        fn empty_environment_defaults_to_gpt4() {
            let settings = settings(&[]);
            assert_eq!(ClientFactory::new(&settings).get_model_name(), "gpt-4");
        }

        #[test]
        fn returns_configured_name() {
            let settings = settings(&[("OPENAI_MODEL_NAME", "llama3")]);
            assert_eq!(ClientFactory::new(&settings).get_model_name(), "llama3");
        }

        #[test]
        fn set_but_empty_name_is_not_defaulted() {
            let settings = settings(&[("OPENAI_MODEL_NAME", "")]);
            assert_eq!(ClientFactory::new(&settings).get_model_name(), "");
        }

        #[test]
        fn merge_consumes_overrides() {
            let settings = full_env();
            let overrides = ModelOverrides::new().top_p(0.5).organization("org-1");
            let request = ModelRequest::from_settings(&settings).merge(overrides);
            assert_eq!(request.top_p, Some(0.5));
            assert_eq!(request.organization.as_deref(), Some("org-1"));
            assert_eq!(request.model, "qwen-turbo");
        }
    }

    mod get_model {
        use super::*;

        #[test]
        fn seeds_request_from_settings() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            factory.get_model(ModelOverrides::new()).unwrap();

            assert_eq!(
                factory.initializer().calls(),
                vec![ModelRequest {
                    model: "qwen-turbo".into(),
                    model_provider: "openai".into(),
                    base_url: Some("https://x/v1".into()),
                    api_key: Some("abc".into()),
                    ..ModelRequest::default()
                }]
            );
        }

        #[test]
        fn temperature_override_is_added() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            factory
                .get_model(ModelOverrides::new().temperature(0.2))
                .unwrap();

            let request = &factory.initializer().calls()[0];
            assert_eq!(request.temperature, Some(0.2));
            assert_eq!(request.model, "qwen-turbo");
            assert_eq!(request.api_key.as_deref(), Some("abc"));
        }

        #[test]
        fn unset_base_url_is_omitted() {
            let settings = settings(&[("OPENAI_BASE_URL", ""), ("OPENAI_API_KEY", "")]);
            let request = ClientFactory::new(&settings).model_request(ModelOverrides::new());
            assert!(request.base_url.is_none());
            assert!(request.api_key.is_none());
            assert_eq!(request.model, "gpt-4");
        }

        #[test]
        fn override_beats_environment() {
            let settings = full_env();
            let request = ClientFactory::new(&settings).model_request(
                ModelOverrides::new()
                    .base_url("http://localhost:11434/v1")
                    .model("llama3")
                    .api_key("other"),
            );
            assert_eq!(request.base_url.as_deref(), Some("http://localhost:11434/v1"));
            assert_eq!(request.model, "llama3");
            assert_eq!(request.api_key.as_deref(), Some("other"));
        }

        #[test]
        fn every_call_builds_a_new_handle() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            factory.get_model(ModelOverrides::new()).unwrap();
            factory.get_model(ModelOverrides::new()).unwrap();
            assert_eq!(factory.initializer().calls().len(), 2);
        }

        #[test]
        fn initializer_errors_propagate() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Failing);
            let err = factory.get_model(ModelOverrides::new()).unwrap_err();
            assert!(matches!(err, Error::Llm(e) if e.kind == LlmErrorKind::Auth));
        }

        #[test]
        fn openai_initializer_builds_client() {
            let settings = full_env();
            let model = ClientFactory::new(&settings)
                .get_model(ModelOverrides::new())
                .unwrap();
            assert_eq!(model.provider_name(), "openai");
            assert_eq!(model.default_model(), "qwen-turbo");
        }

        #[test]
        fn unknown_provider_is_not_supported() {
            let settings = full_env();
            let err = ClientFactory::new(&settings)
                .get_model(ModelOverrides::new().model_provider("anthropic"))
                .unwrap_err();
            match err {
                Error::Llm(e) => {
                    assert_eq!(e.kind, LlmErrorKind::NotSupported);
                    assert!(e.message.contains("anthropic"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn debug_redacts_api_key() {
            let request = ModelRequest::from_settings(&full_env());
            assert!(!format!("{request:?}").contains("abc"));
        }
    }

    mod get_agent {
        use super::*;

        #[test]
        fn builds_exactly_one_default_model() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            let agent = factory
                .get_agent(
                    AgentOverrides::new()
                        .tool(Box::new(Search))
                        .system_prompt("p"),
                )
                .unwrap();

            let calls = factory.initializer().calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0], ModelRequest::from_settings(&settings));
            assert!(Arc::ptr_eq(agent.provider(), &factory.initializer().handle));
            assert_eq!(agent.tool_names(), vec!["web_search"]);
            assert_eq!(agent.system_prompt(), "p");
        }

        #[test]
        fn explicit_model_is_forwarded_unchanged() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            let explicit: SharedChatProvider = Arc::new(MockProvider::new(Vec::new()));

            let agent = factory
                .get_agent(AgentOverrides::new().model(Arc::clone(&explicit)))
                .unwrap();

            assert!(factory.initializer().calls().is_empty());
            assert!(Arc::ptr_eq(agent.provider(), &explicit));
        }

        #[test]
        fn model_failure_stops_agent_construction() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Failing);
            assert!(factory.get_agent(AgentOverrides::new()).is_err());
        }

        #[test]
        fn agent_errors_propagate() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            let err = factory
                .get_agent(
                    AgentOverrides::new()
                        .tool(Box::new(Search))
                        .tool(Box::new(Search)),
                )
                .unwrap_err();
            assert!(matches!(err, Error::Agent(_)));
        }

        #[test]
        fn name_and_step_limit_pass_through() {
            let settings = full_env();
            let factory = ClientFactory::with_initializer(&settings, Recording::new());
            let agent = factory
                .get_agent(AgentOverrides::new().name("chef").max_steps(3))
                .unwrap();
            assert_eq!(agent.name(), "chef");
            assert_eq!(agent.step_limit(), 3);
        }
    }
}
