//! CLI bootstrap - the composition root.
//!
//! This module is the only place where adapters are instantiated and wired
//! into the pipeline:
//! - HTTP language model and speech adapters
//! - Terminal audio output and console event rendering
//! - Coordinator transport (HTTP when reachable, local mock otherwise)
//! - JSON-file record store behind the broadcast library
//!
//! Command handlers receive the composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use anchordesk_core::ports::{
    AudioOutputPort, CoordinatorTransport, LanguageModelPort, RecordStorePort,
    SpeechSynthesisPort, StudioEventEmitter,
};
use anchordesk_core::{BroadcastLibrary, StudioSettings, validate_settings};
use anchordesk_dispatch::{CapacityPool, DialogueGenerator, SpeechSynthesizer, TaskDispatcher};
use anchordesk_handshake::{HandshakeClient, HandshakeConfig, connect_coordinator};
use anchordesk_studio::{BroadcastPipeline, FeedOrchestrator, QueueManager, StudioOrchestrator};

use crate::adapters::{ConsoleEmitter, HttpSpeech, JsonFileStore, OpenAiChat, TerminalAudio};
use crate::error::CliError;
use crate::parser::{Cli, DEFAULT_LLM_URL, DEFAULT_STORE_PATH, DEFAULT_TTS_URL, DEFAULT_USER};

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub llm_url: String,
    pub llm_model: Option<String>,
    pub llm_key: Option<String>,
    pub tts_url: String,
    pub tts_model: Option<String>,
    pub player: Option<String>,
    pub coordinator_url: Option<String>,
    pub store_path: PathBuf,
    /// Owner of saved broadcasts.
    pub user: String,
    /// Where synthesized clips are written.
    pub clip_dir: PathBuf,
    pub settings: StudioSettings,
}

impl CliConfig {
    /// Local endpoints and default studio settings.
    pub fn with_defaults() -> Self {
        Self {
            llm_url: DEFAULT_LLM_URL.to_string(),
            llm_model: None,
            llm_key: None,
            tts_url: DEFAULT_TTS_URL.to_string(),
            tts_model: None,
            player: None,
            coordinator_url: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            user: DEFAULT_USER.to_string(),
            clip_dir: std::env::temp_dir().join("anchordesk-clips"),
            settings: StudioSettings::with_defaults(),
        }
    }

    /// Config from parsed arguments, reading the settings file if one was given.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let settings = match &cli.settings {
            Some(path) => load_settings(path)?,
            None => StudioSettings::with_defaults(),
        };
        validate_settings(&settings)?;

        Ok(Self {
            llm_url: cli.llm_url.clone(),
            llm_model: cli.llm_model.clone(),
            llm_key: cli.llm_key.clone(),
            tts_url: cli.tts_url.clone(),
            tts_model: cli.tts_model.clone(),
            player: cli.player.clone(),
            coordinator_url: cli.coordinator_url.clone(),
            store_path: cli.store.clone(),
            user: cli.user.clone(),
            settings,
            ..Self::with_defaults()
        })
    }
}

fn load_settings(path: &std::path::Path) -> Result<StudioSettings, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub user: String,
    pub settings: StudioSettings,
    pub library: BroadcastLibrary,
    pub studio: Arc<StudioOrchestrator>,
    pub feed: Arc<FeedOrchestrator>,
    pub pipeline: Arc<BroadcastPipeline>,
    pub queue: Arc<QueueManager>,
    pub dispatcher: Arc<TaskDispatcher>,
    pub coordinator: Arc<dyn CoordinatorTransport>,
}

impl CliContext {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub const fn library(&self) -> &BroadcastLibrary {
        &self.library
    }

    pub fn studio(&self) -> &Arc<StudioOrchestrator> {
        &self.studio
    }

    pub fn feed(&self) -> &Arc<FeedOrchestrator> {
        &self.feed
    }

    pub fn pipeline(&self) -> &Arc<BroadcastPipeline> {
        &self.pipeline
    }

    pub fn queue(&self) -> &Arc<QueueManager> {
        &self.queue
    }

    pub fn dispatcher(&self) -> &Arc<TaskDispatcher> {
        &self.dispatcher
    }

    pub fn coordinator(&self) -> &Arc<dyn CoordinatorTransport> {
        &self.coordinator
    }
}

/// Bootstrap the CLI application.
///
/// Wiring order:
/// 1. Capacity pool and dispatcher from the model registry
/// 2. Language model and speech adapters behind the dispatcher
/// 3. Coordinator transport, probed once
/// 4. Record store and library
/// 5. Pipeline, queue, and the two orchestrators
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let settings = config.settings;

    // 1. Dispatcher over the configured model slots
    let dispatcher = Arc::new(TaskDispatcher::new(CapacityPool::new(&settings.models)));

    // 2. Hosted services
    let llm: Arc<dyn LanguageModelPort> = Arc::new(
        OpenAiChat::new(config.llm_url, config.llm_model, config.llm_key)
            .context("failed to create language model client")?,
    );
    tokio::fs::create_dir_all(&config.clip_dir)
        .await
        .with_context(|| format!("failed to create {}", config.clip_dir.display()))?;
    let tts: Arc<dyn SpeechSynthesisPort> = Arc::new(
        HttpSpeech::new(config.tts_url, config.tts_model, config.clip_dir)
            .context("failed to create speech client")?,
    );
    let audio: Arc<dyn AudioOutputPort> = Arc::new(TerminalAudio::new(config.player.as_deref()));
    let emitter: Arc<dyn StudioEventEmitter> = Arc::new(ConsoleEmitter::new());

    let dialogue = Arc::new(DialogueGenerator::new(Arc::clone(&dispatcher), llm));
    let speech = Arc::new(SpeechSynthesizer::new(
        Arc::clone(&dispatcher),
        tts,
        Arc::clone(&audio),
        settings.audio_load_timeout(),
    ));

    // 3. Coordinator
    let coordinator = connect_coordinator(
        config.coordinator_url.as_deref(),
        Duration::from_millis(settings.handshake_timeout_ms),
    )
    .await;
    let handshake = Arc::new(HandshakeClient::new(
        Arc::clone(&coordinator),
        HandshakeConfig::from_settings(&settings),
    ));

    // 4. Persistence
    let store: Arc<dyn RecordStorePort> = Arc::new(
        JsonFileStore::open(&config.store_path)
            .await
            .with_context(|| format!("failed to open {}", config.store_path.display()))?,
    );
    let library = BroadcastLibrary::new(store);

    // 5. Orchestration
    let pipeline = Arc::new(BroadcastPipeline::new(
        handshake,
        Arc::clone(&speech),
        audio,
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
        config.user.clone(),
        &settings,
    ));
    let feed = Arc::new(FeedOrchestrator::new(Arc::clone(&pipeline), library.clone()));

    info!(
        target: "anchordesk.cli",
        user = %config.user,
        coordinator = coordinator.label(),
        store = %config.store_path.display(),
        "Studio ready"
    );

    Ok(CliContext {
        user: config.user,
        settings,
        library,
        studio,
        feed,
        pipeline,
        queue,
        dispatcher,
        coordinator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_settings_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"lines_per_anchor": 2, "tone": "casual"}"#).unwrap();

        let cli = Cli::parse_from([
            "anchordesk",
            "--settings",
            path.to_str().unwrap(),
            "status",
        ]);
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.settings.lines_per_anchor, 2);
        assert_eq!(config.settings.tone.as_str(), "casual");
        assert_eq!(config.settings.overlay_ms, 5500);
    }

    #[test]
    fn test_invalid_settings_are_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"lines_per_anchor": 11}"#).unwrap();

        let cli = Cli::parse_from(["anchordesk", "--settings", path.to_str().unwrap(), "status"]);
        let err = CliConfig::from_cli(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[tokio::test]
    async fn test_bootstrap_without_services_uses_mock_coordinator() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            store_path: dir.path().join("feed.json"),
            clip_dir: dir.path().join("clips"),
            user: "dana".into(),
            ..CliConfig::with_defaults()
        };

        let ctx = bootstrap(config).await.unwrap();
        assert_eq!(ctx.coordinator().label(), "mock");
        assert_eq!(ctx.user(), "dana");
        assert!(ctx.pipeline().snapshot().guard.is_at_rest());
        assert!(ctx.dispatcher().status().is_at_rest());
        assert!(dir.path().join("clips").is_dir());
    }
}
