//! Built-in tools.
//!
//! - [`web_search`] - Tavily-backed `web_search(query)`

pub mod web_search;

pub use web_search::{
    SearchResponse, SearchResult, TavilyClient, TavilyConfig, WebSearchArgs, WebSearchTool,
};
