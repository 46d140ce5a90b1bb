//! Agent module: a tool-calling conversational loop over one chat model.
//!
//! - **[`Agent`]** describes what the agent is: name, system prompt, model
//!   handle, tools and a step limit.
//! - **[`Runner`]** drives it: call the model, run requested tools, feed the
//!   results back, stop on a plain answer.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pantry::agent::{AgentRequest, create_agent};
//!
//! let agent = create_agent(
//!     AgentRequest::new(provider)
//!         .tools(vec![Box::new(WebSearchTool::from_env()?)])
//!         .system_prompt("You are a personal chef."),
//! )?;
//!
//! let result = agent.run("I have eggs and spinach").await?;
//! println!("{}", result.output);
//! ```

mod config;
pub mod result;
mod runner;

pub use config::{Agent, AgentRequest, create_agent};
pub use result::RunResult;
pub use runner::Runner;
