//! OpenAI-compatible chat completions client.
//!
//! Works against the public OpenAI API and any server exposing the same
//! `/chat/completions` endpoint (set a custom base URL).

mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
