//! Chat model port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;

/// Chat model errors
#[derive(Debug, Clone, Error)]
pub enum ChatModelError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Empty model response")]
    EmptyResponse,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// One part of a generate request
#[derive(Debug, Clone)]
pub enum RequestPart {
    Text(String),
    Audio(AudioData),
}

/// A single-shot generate request
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Backend model identifier
    pub model: String,
    /// Ordered message parts (text and/or inline audio)
    pub parts: Vec<RequestPart>,
    /// Optional system instruction
    pub system_instruction: Option<String>,
    /// Internal-reasoning token budget. `Some(0)` disables reasoning;
    /// `None` leaves the backend default in place.
    pub thinking_budget: Option<i32>,
    /// Reply length cap. `None` leaves the backend default in place.
    pub max_output_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Build a plain text request against a model
    pub fn text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: vec![RequestPart::Text(text.into())],
            system_instruction: None,
            thinking_budget: None,
            max_output_tokens: None,
        }
    }

    /// Set the reasoning budget
    pub fn with_thinking_budget(mut self, budget: i32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Port for single-shot generation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Issue one request and return the generated text
    async fn generate(&self, request: GenerateRequest) -> Result<String, ChatModelError>;
}
