//! Agent run result types.

use std::fmt::Write as _;

use crate::message::Message;
use crate::usage::Usage;

/// Outcome of a completed agent run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The final text answer.
    pub output: String,
    /// Token usage summed over every model call in the run.
    pub usage: Usage,
    /// Number of model calls made.
    pub steps: usize,
    /// Full transcript without the system message, ending with the final
    /// assistant reply. Append a user message and pass it to
    /// [`Agent::run_conversation`](super::Agent::run_conversation) to continue.
    pub messages: Vec<Message>,
}

impl RunResult {
    /// Generate a one-line-per-field summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::with_capacity(128);
        let _ = writeln!(summary, "Steps Taken: {}", self.steps);
        let _ = writeln!(summary, "Tokens: {}", self.usage);
        let _ = writeln!(summary, "Messages: {}", self.messages.len());
        summary
    }
}
