//! Shared mock ports for dispatch integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use anchordesk_core::ports::{AudioOutputPort, SpeechSynthesisPort};
use anchordesk_core::settings::{ModelPoolConfig, ModelSpec};
use anchordesk_core::{AudioHandle, PortError, Voice};
use anchordesk_dispatch::{CapacityPool, TaskDispatcher};

pub fn dispatcher(dialogue: u32, speech: u32) -> Arc<TaskDispatcher> {
    let pool = CapacityPool::new(&ModelPoolConfig {
        dialogue: vec![ModelSpec::new("writer", dialogue)],
        speech: vec![ModelSpec::new("voice-a", speech), ModelSpec::new("voice-b", speech)],
    });
    Arc::new(TaskDispatcher::new(pool))
}

// ── Speech service ─────────────────────────────────────────────────

/// Renders `text` to a `mock://<text>` handle after a text-dependent delay.
///
/// - text containing `fail` errors
/// - `delay_ms` maps the text to a render delay
pub struct MockTts {
    pub calls: Mutex<Vec<(String, Voice)>>,
    delay_ms: fn(&str) -> u64,
}

impl MockTts {
    pub fn new(delay_ms: fn(&str) -> u64) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay_ms,
        }
    }

    pub fn instant() -> Self {
        Self::new(|_| 0)
    }
}

#[async_trait]
impl SpeechSynthesisPort for MockTts {
    async fn synthesize(
        &self,
        _model_id: &str,
        text: &str,
        voice: Voice,
    ) -> Result<AudioHandle, PortError> {
        self.calls.lock().unwrap().push((text.to_string(), voice));
        tokio::time::sleep(Duration::from_millis((self.delay_ms)(text))).await;
        if text.contains("fail") {
            return Err(PortError::Status {
                status: 500,
                message: "render failed".into(),
            });
        }
        Ok(AudioHandle::new(format!("mock://{text}")))
    }
}

// ── Audio device ───────────────────────────────────────────────────

/// `broken` clips fail to load, `stall` clips never finish loading.
#[derive(Default)]
pub struct MockAudio {
    pub played: Mutex<Vec<String>>,
    pub stops: Mutex<usize>,
}

#[async_trait]
impl AudioOutputPort for MockAudio {
    async fn wait_playable(&self, handle: &AudioHandle) -> Result<(), PortError> {
        if handle.uri.contains("broken") {
            return Err(PortError::Other("decode error".into()));
        }
        if handle.uri.contains("stall") {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn play(&self, handle: &AudioHandle) -> Result<(), PortError> {
        self.played.lock().unwrap().push(handle.uri.clone());
        Ok(())
    }

    fn stop_all(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}
