//! HTTP speech adapter.
//!
//! Posts `{model, input, voice}` to an OpenAI-style speech endpoint and
//! writes the returned audio into a clip directory. The handle's uri is the
//! clip's file path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use anchordesk_core::ports::SpeechSynthesisPort;
use anchordesk_core::{AudioHandle, PortError, Voice};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

pub struct HttpSpeech {
    client: Client,
    url: String,
    model: Option<String>,
    clip_dir: PathBuf,
}

impl HttpSpeech {
    pub fn new(
        url: impl Into<String>,
        model: Option<String>,
        clip_dir: impl Into<PathBuf>,
    ) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PortError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            model,
            clip_dir: clip_dir.into(),
        })
    }

    pub fn clip_dir(&self) -> &Path {
        &self.clip_dir
    }
}

#[async_trait]
impl SpeechSynthesisPort for HttpSpeech {
    async fn synthesize(
        &self,
        model_id: &str,
        text: &str,
        voice: Voice,
    ) -> Result<AudioHandle, PortError> {
        let body = SpeechBody {
            model: self.model.as_deref().unwrap_or(model_id),
            input: text,
            voice: voice.as_str(),
            response_format: "mp3",
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
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

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::InvalidPayload(e.to_string()))?;
        if bytes.is_empty() {
            return Err(PortError::InvalidPayload("empty audio response".into()));
        }

        let path = self.clip_dir.join(format!("{}.mp3", Uuid::new_v4().simple()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| PortError::Storage(format!("{}: {e}", path.display())))?;
        debug!(target: "anchordesk.cli", path = %path.display(), bytes = bytes.len(), %voice, "Clip written");

        Ok(AudioHandle::new(path.to_string_lossy()))
    }
}
