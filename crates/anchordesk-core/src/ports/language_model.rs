//! Language model port: one structured chat completion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Ask the model for a JSON document.
    pub json_mode: bool,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            json_mode: false,
            temperature: None,
        }
    }

    #[must_use]
    pub const fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Hosted language model.
///
/// `model_id` is the dispatcher's resource model chosen for this call; an
/// adapter may map it to a concrete model name or ignore it.
#[async_trait]
pub trait LanguageModelPort: Send + Sync {
    /// Returns the raw content of the first choice.
    async fn complete(&self, model_id: &str, request: &ChatRequest) -> Result<String, PortError>;
}
