//! Web search backed by the Tavily search API.
//!
//! [`WebSearchTool`] exposes a single `web_search(query)` function to the
//! model and returns Tavily's structured response (titles, URLs, content
//! snippets and relevance scores) as the tool output.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{Tool, ToolResult};

/// Environment variable holding the Tavily API key.
pub const API_KEY_VAR: &str = "TAVILY_API_KEY";
/// Environment variable overriding the Tavily endpoint.
pub const BASE_URL_VAR: &str = "TAVILY_BASE_URL";

/// Tavily client configuration.
#[derive(Clone)]
pub struct TavilyConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Endpoint base URL, without `/search`.
    pub base_url: String,
    /// Maximum number of results per query.
    pub max_results: u32,
    /// `"basic"` or `"advanced"`.
    pub search_depth: String,
    /// Ask Tavily for a short synthesized answer.
    pub include_answer: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl TavilyConfig {
    /// Default Tavily endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.tavily.com";

    /// Create a configuration with default search settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            max_results: 5,
            search_depth: "basic".to_owned(),
            include_answer: false,
            timeout_secs: 30,
        }
    }

    /// Read `TAVILY_API_KEY` and `TAVILY_BASE_URL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotInitialized`] when the API key is missing.
    pub fn from_env() -> ToolResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over any variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotInitialized`] when the API key is missing.
    pub fn from_lookup<F>(lookup: F) -> ToolResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v: &String| !v.is_empty());

        let api_key = non_empty(API_KEY_VAR)
            .ok_or_else(|| ToolError::not_initialized(format!("{API_KEY_VAR} is not set")))?;
        let mut config = Self::new(api_key);
        if let Some(url) = non_empty(BASE_URL_VAR) {
            config = config.with_base_url(url);
        }
        Ok(config)
    }

    /// Set the endpoint. A trailing `/` is dropped.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Set the maximum number of results.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the search depth.
    #[must_use]
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    /// Ask for a synthesized answer alongside the results.
    #[must_use]
    pub const fn with_include_answer(mut self, include: bool) -> Self {
        self.include_answer = include;
        self
    }
}

impl std::fmt::Debug for TavilyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_results", &self.max_results)
            .field("search_depth", &self.search_depth)
            .field("include_answer", &self.include_answer)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    include_answer: bool,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page URL.
    #[serde(default)]
    pub url: String,
    /// Relevant content extracted from the page.
    #[serde(default)]
    pub content: String,
    /// Relevance score.
    #[serde(default)]
    pub score: f64,
}

/// Tavily search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query as Tavily understood it.
    #[serde(default)]
    pub query: String,
    /// Synthesized answer, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Ranked results.
    #[serde(default)]
    pub results: Vec<SearchResult>,
    /// Server-side latency in seconds.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub response_time: Option<f64>,
}

// Tavily has sent `response_time` both as a number and as a numeric string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// HTTP client for the Tavily search endpoint.
#[derive(Debug, Clone)]
pub struct TavilyClient {
    config: TavilyConfig,
    client: reqwest::Client,
}

impl TavilyClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if the HTTP client cannot be built.
    pub fn new(config: TavilyConfig) -> ToolResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::execution(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TavilyConfig {
        &self.config
    }

    /// Run a search.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] on transport failures, non-success
    /// status codes, or an unreadable response body.
    pub async fn search(&self, query: &str) -> ToolResult<SearchResponse> {
        let url = format!("{}/search", self.config.base_url);
        let body = SearchRequest {
            query,
            search_depth: &self.config.search_depth,
            max_results: self.config.max_results,
            include_answer: self.config.include_answer,
        };
        debug!(url = %url, query, max_results = body.max_results, "Sending search request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ToolError::execution(format!("Search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ToolError::execution(format!(
                "Search failed with HTTP {}: {text}",
                status.as_u16()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::execution(format!("Invalid search response: {e}")))?;
        debug!(results = parsed.results.len(), "Search completed");
        Ok(parsed)
    }
}

/// Arguments for web search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchArgs {
    /// The search query to perform.
    pub query: String,
}

/// The `web_search` tool.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    client: TavilyClient,
}

impl WebSearchTool {
    /// Create the tool over a configured Tavily client.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] if the HTTP client cannot be built.
    pub fn new(config: TavilyConfig) -> ToolResult<Self> {
        Ok(Self {
            client: TavilyClient::new(config)?,
        })
    }

    /// Create the tool from `TAVILY_API_KEY` / `TAVILY_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotInitialized`] when the API key is missing.
    pub fn from_env() -> ToolResult<Self> {
        Self::new(TavilyConfig::from_env()?)
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &TavilyClient {
        &self.client
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    const NAME: &'static str = "web_search";
    type Args = WebSearchArgs;
    type Output = SearchResponse;
    type Error = ToolError;

    fn description(&self) -> String {
        "Search the web for information".to_owned()
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to perform"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let query = args.query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid_args("query must not be empty"));
        }
        self.client.search(query).await
    }
}
