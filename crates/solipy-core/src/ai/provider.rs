use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::message::ChatMessage;
use crate::error::AppError;

/// Token usage from an AI provider call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Sampling and transport parameters for a single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub temperature: f32,
    pub max_tokens: u32,
    /// `None` waits as long as the server takes.
    pub timeout: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Send messages with one HTTP request and return the first choice's text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        request: &CompletionRequest,
    ) -> Result<(String, Option<TokenUsage>), AppError>;
}
