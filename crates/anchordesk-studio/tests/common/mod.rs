//! Shared mock ports and wiring for studio integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use anchordesk_core::contracts::coordinator::{
    EndNotice, LiveNotice, NotifyResponse, StartRequest, StartResponse,
};
use anchordesk_core::ports::{
    AudioOutputPort, ChatRequest, CoordinatorTransport, LanguageModelPort, SpeechSynthesisPort,
};
use anchordesk_core::settings::{ModelPoolConfig, ModelSpec};
use anchordesk_core::{
    AudioHandle, BroadcastLibrary, BroadcastPhase, InMemoryRecordStore, PortError, StudioEvent,
    StudioEventEmitter, StudioSettings, Voice,
};
use anchordesk_dispatch::{CapacityPool, DialogueGenerator, SpeechSynthesizer, TaskDispatcher};
use anchordesk_handshake::{HandshakeClient, HandshakeConfig, MockCoordinator};
use anchordesk_studio::{BroadcastPipeline, FeedOrchestrator, QueueManager, StudioOrchestrator};

// ── Event sink ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<StudioEvent>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<StudioEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<BroadcastPhase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StudioEvent::PhaseChanged { phase, .. } => Some(phase),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StudioEvent::Status { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, wanted: &StudioEvent) -> bool {
        self.events.lock().unwrap().iter().any(|event| event == wanted)
    }
}

impl StudioEventEmitter for Recorder {
    fn emit(&self, event: StudioEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn StudioEventEmitter> {
        Box::new(self.clone())
    }
}

// ── Language model ─────────────────────────────────────────────────

/// Replies with a long alternating script after `delay_ms`.
///
/// Prompts mentioning `fail` error immediately.
pub struct MockLlm {
    delay_ms: u64,
    pub calls: Mutex<usize>,
}

impl MockLlm {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl LanguageModelPort for MockLlm {
    async fn complete(&self, _model_id: &str, request: &ChatRequest) -> Result<String, PortError> {
        *self.calls.lock().unwrap() += 1;
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if prompt.contains("fail") {
            return Err(PortError::Status {
                status: 500,
                message: "model overloaded".into(),
            });
        }
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        let lines: Vec<_> = (0..20)
            .map(|i| {
                let speaker = if i % 2 == 0 { "James" } else { "Sarah" };
                serde_json::json!({ "speaker": speaker, "text": format!("Line {i}.") })
            })
            .collect();
        Ok(serde_json::Value::Array(lines).to_string())
    }
}

// ── Speech service ─────────────────────────────────────────────────

pub struct MockTts {
    delay_ms: u64,
}

#[async_trait]
impl SpeechSynthesisPort for MockTts {
    async fn synthesize(
        &self,
        _model_id: &str,
        text: &str,
        _voice: Voice,
    ) -> Result<AudioHandle, PortError> {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        Ok(AudioHandle::new(format!("mock://{text}")))
    }
}

// ── Audio device ───────────────────────────────────────────────────

/// Each clip plays for `play_ms`.
pub struct MockAudio {
    play_ms: u64,
    pub played: Mutex<Vec<String>>,
    pub stops: Mutex<usize>,
}

impl MockAudio {
    pub fn new(play_ms: u64) -> Self {
        Self {
            play_ms,
            played: Mutex::new(Vec::new()),
            stops: Mutex::new(0),
        }
    }
}

#[async_trait]
impl AudioOutputPort for MockAudio {
    async fn wait_playable(&self, _handle: &AudioHandle) -> Result<(), PortError> {
        Ok(())
    }

    async fn play(&self, handle: &AudioHandle) -> Result<(), PortError> {
        tokio::time::sleep(Duration::from_millis(self.play_ms)).await;
        self.played.lock().unwrap().push(handle.uri.clone());
        Ok(())
    }

    fn stop_all(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}

// ── Coordinator ────────────────────────────────────────────────────

/// Never answers a start request; beacons succeed.
pub struct SilentCoordinator;

#[async_trait]
impl CoordinatorTransport for SilentCoordinator {
    async fn start(&self, _request: &StartRequest) -> Result<StartResponse, PortError> {
        std::future::pending().await
    }

    async fn live(&self, _notice: &LiveNotice) -> Result<NotifyResponse, PortError> {
        Ok(NotifyResponse::new("acknowledged"))
    }

    async fn end(&self, _notice: &EndNotice) -> Result<NotifyResponse, PortError> {
        Ok(NotifyResponse::new("acknowledged"))
    }

    async fn status(&self) -> Result<serde_json::Value, PortError> {
        Ok(serde_json::json!({ "status": "ok" }))
    }

    fn label(&self) -> &'static str {
        "silent"
    }
}

// ── Wiring ─────────────────────────────────────────────────────────

pub struct Timings {
    pub llm_ms: u64,
    pub tts_ms: u64,
    pub play_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            llm_ms: 100,
            tts_ms: 100,
            play_ms: 500,
        }
    }
}

pub fn settings() -> StudioSettings {
    StudioSettings {
        lines_per_anchor: 1,
        overlay_ms: 200,
        ..StudioSettings::with_defaults()
    }
}

pub struct Harness {
    pub studio: Arc<StudioOrchestrator>,
    pub feed: Arc<FeedOrchestrator>,
    pub pipeline: Arc<BroadcastPipeline>,
    pub queue: Arc<QueueManager>,
    pub library: BroadcastLibrary,
    pub dispatcher: Arc<TaskDispatcher>,
    pub audio: Arc<MockAudio>,
    pub recorder: Recorder,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(Arc::new(MockCoordinator::new()), &Timings::default())
    }

    pub fn build(coordinator: Arc<dyn CoordinatorTransport>, timings: &Timings) -> Self {
        let settings = settings();
        let recorder = Recorder::default();
        let emitter: Arc<dyn StudioEventEmitter> = Arc::new(recorder.clone());

        let dispatcher = Arc::new(TaskDispatcher::new(CapacityPool::new(&ModelPoolConfig {
            dialogue: vec![ModelSpec::new("writer", 4)],
            speech: vec![ModelSpec::new("voice-a", 4), ModelSpec::new("voice-b", 4)],
        })));
        let audio = Arc::new(MockAudio::new(timings.play_ms));
        let dialogue = Arc::new(DialogueGenerator::new(
            Arc::clone(&dispatcher),
            Arc::new(MockLlm::new(timings.llm_ms)),
        ));
        let speech = Arc::new(SpeechSynthesizer::new(
            Arc::clone(&dispatcher),
            Arc::new(MockTts {
                delay_ms: timings.tts_ms,
            }),
            audio.clone(),
            settings.audio_load_timeout(),
        ));
        let handshake = Arc::new(HandshakeClient::new(
            coordinator,
            HandshakeConfig::from_settings(&settings),
        ));
        let library = BroadcastLibrary::new(Arc::new(InMemoryRecordStore::new()));

        let pipeline = Arc::new(BroadcastPipeline::new(
            handshake,
            Arc::clone(&speech),
            audio.clone(),
            Arc::clone(&emitter),
            &settings,
        ));
        let queue = Arc::new(QueueManager::new(
            Arc::clone(&dialogue),
            speech,
            emitter,
            &settings,
        ));
        let studio = Arc::new(StudioOrchestrator::new(
            Arc::clone(&pipeline),
            dialogue,
            Arc::clone(&queue),
            library.clone(),
            "user-1",
            &settings,
        ));
        let feed = Arc::new(FeedOrchestrator::new(Arc::clone(&pipeline), library.clone()));

        Self {
            studio,
            feed,
            pipeline,
            queue,
            library,
            dispatcher,
            audio,
            recorder,
        }
    }

    /// Poll until the pipeline reaches `phase`.
    pub async fn wait_for_phase(&self, phase: BroadcastPhase) {
        while self.pipeline.snapshot().phase != phase {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
