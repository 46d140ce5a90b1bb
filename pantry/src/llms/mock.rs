//! Mock chat provider for testing.
//!
//! Replays scripted [`ChatResponse`]s in order and records every request it
//! receives, so agent loops can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use pantry::prelude::*;
//!
//! let mock = MockProvider::new(vec![ChatResponse::from_text("Omelette.")]);
//! let reply = mock.complete("I have eggs").await?;
//! assert_eq!(reply, "Omelette.");
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};

/// A scripted chat provider.
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a provider that returns `responses` one per call.
    #[must_use]
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            model: "mock-model".to_owned(),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that answers each call with the next text reply.
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ChatResponse::from_text).collect())
    }

    /// Set the model identifier reported by [`ChatProvider::default_model`].
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| LlmError::internal("mock provider has no scripted responses left").into())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
