//! Pantry - environment-driven chat model and agent construction
//!
//! This crate resolves OpenAI-compatible model settings from the process
//! environment once at startup and builds chat model handles and
//! tool-calling agents from them.
//!
//! ```rust,ignore
//! use pantry::prelude::*;
//!
//! let settings = ModelSettings::from_env();
//! let factory = ClientFactory::new(&settings);
//! let agent = factory.get_agent(
//!     AgentOverrides::new()
//!         .tool(Box::new(WebSearchTool::from_env()?))
//!         .system_prompt("You are a personal chef."),
//! )?;
//! let result = agent.run("eggs, spinach, feta").await?;
//! ```

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod factory;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod tool;
pub mod tools;
pub mod usage;

pub use config::ModelSettings;
pub use error::{Error, LlmError, Result, ToolError};
pub use factory::ClientFactory;
