//! OpenAI-compatible chat-completions adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use anchordesk_core::ports::{ChatMessage, ChatRequest, LanguageModelPort};
use anchordesk_core::PortError;

/// Generation can take a while on a busy model.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiChat {
    client: Client,
    url: String,
    /// Overrides the dispatcher's slot id when set.
    model: Option<String>,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(
        url: impl Into<String>,
        model: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            model,
            api_key,
        })
    }

    fn body<'a>(&'a self, model_id: &'a str, request: &'a ChatRequest) -> CompletionBody<'a> {
        CompletionBody {
            model: self.model.as_deref().unwrap_or(model_id),
            messages: &request.messages,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl LanguageModelPort for OpenAiChat {
    async fn complete(&self, model_id: &str, request: &ChatRequest) -> Result<String, PortError> {
        let body = self.body(model_id, request);
        debug!(target: "anchordesk.cli", url = %self.url, model = body.model, "Chat completion");

        let mut builder = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PortError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| PortError::InvalidPayload(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| PortError::InvalidPayload("completion has no content".into()))
    }
}
