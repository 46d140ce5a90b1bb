//! Chat model backends.
//!
//! - [`openai`] - OpenAI and OpenAI-compatible servers
//! - [`mock`] - Scripted in-process provider for tests and offline runs

pub mod mock;
pub mod openai;

pub use mock::MockProvider;
pub use openai::{OpenAI, OpenAIConfig};
