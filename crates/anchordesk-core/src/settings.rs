//! Studio settings and validation.
//!
//! Pure data with defaults that match the production timings. Adapters load
//! these from files or flags; tests shrink the delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Personality, TaskKind, Tone, Visibility};

/// Default lines per anchor before the outro.
pub const DEFAULT_LINES_PER_ANCHOR: u8 = 3;

/// Preparations the queue runs at once.
pub const DEFAULT_MAX_PARALLEL_PREP: usize = 3;

/// Handshake attempts before giving up.
pub const DEFAULT_HANDSHAKE_ATTEMPTS: u32 = 3;

/// A capacity-bounded model registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub max_concurrent: u32,
}

impl ModelSpec {
    pub fn new(id: impl Into<String>, max_concurrent: u32) -> Self {
        Self {
            id: id.into(),
            max_concurrent,
        }
    }
}

/// Model registry per task kind, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPoolConfig {
    pub dialogue: Vec<ModelSpec>,
    pub speech: Vec<ModelSpec>,
}

impl Default for ModelPoolConfig {
    fn default() -> Self {
        Self {
            dialogue: vec![
                ModelSpec::new("primary", 5),
                ModelSpec::new("secondary", 5),
                ModelSpec::new("fallback", 10),
            ],
            speech: vec![
                ModelSpec::new("tts-service-1", 8),
                ModelSpec::new("tts-service-2", 8),
            ],
        }
    }
}

impl ModelPoolConfig {
    pub fn models_for(&self, kind: TaskKind) -> &[ModelSpec] {
        match kind {
            TaskKind::Dialogue => &self.dialogue,
            TaskKind::Speech => &self.speech,
        }
    }
}

/// Everything the pipeline needs to know that is not a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioSettings {
    /// Lines per anchor, 1-10.
    pub lines_per_anchor: u8,
    pub tone: Tone,
    pub personality_a: Personality,
    pub personality_b: Personality,
    /// Visibility for broadcasts saved from the studio.
    pub default_visibility: Visibility,

    pub max_parallel_prep: usize,

    pub handshake_attempts: u32,
    pub handshake_timeout_ms: u64,
    pub handshake_retry_delay_ms: u64,

    /// Pause between segments.
    pub segment_gap_ms: u64,
    /// How long a clip may take to become playable.
    pub audio_load_timeout_ms: u64,
    /// Delay before a canceled guard is re-armed.
    pub cancel_cleanup_ms: u64,
    /// Lifetime of the "loading canceled" indicator.
    pub canceled_indicator_ms: u64,
    /// Intro/outro overlay, fade included.
    pub overlay_ms: u64,
    /// Pause after synthesis completes before playback starts.
    pub ready_pause_ms: u64,

    pub models: ModelPoolConfig,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl StudioSettings {
    /// Create settings with production defaults.
    pub fn with_defaults() -> Self {
        Self {
            lines_per_anchor: DEFAULT_LINES_PER_ANCHOR,
            tone: Tone::Serious,
            personality_a: Personality::Default,
            personality_b: Personality::Default,
            default_visibility: Visibility::Private,
            max_parallel_prep: DEFAULT_MAX_PARALLEL_PREP,
            handshake_attempts: DEFAULT_HANDSHAKE_ATTEMPTS,
            handshake_timeout_ms: 2000,
            handshake_retry_delay_ms: 200,
            segment_gap_ms: 300,
            audio_load_timeout_ms: 10_000,
            cancel_cleanup_ms: 300,
            canceled_indicator_ms: 3000,
            overlay_ms: 5500,
            ready_pause_ms: 800,
            models: ModelPoolConfig::default(),
        }
    }

    pub const fn segment_gap(&self) -> Duration {
        Duration::from_millis(self.segment_gap_ms)
    }

    pub const fn audio_load_timeout(&self) -> Duration {
        Duration::from_millis(self.audio_load_timeout_ms)
    }

    pub const fn cancel_cleanup(&self) -> Duration {
        Duration::from_millis(self.cancel_cleanup_ms)
    }

    pub const fn canceled_indicator(&self) -> Duration {
        Duration::from_millis(self.canceled_indicator_ms)
    }

    pub const fn overlay(&self) -> Duration {
        Duration::from_millis(self.overlay_ms)
    }

    pub const fn ready_pause(&self) -> Duration {
        Duration::from_millis(self.ready_pause_ms)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Lines per anchor must be between 1 and 10, got {0}")]
    InvalidLinesPerAnchor(u8),

    #[error("Parallel preparation limit must be at least 1")]
    InvalidParallelPrep,

    #[error("Handshake attempts must be at least 1")]
    InvalidHandshakeAttempts,

    #[error("Handshake timeout must be greater than zero")]
    InvalidHandshakeTimeout,

    #[error("No {0} models registered")]
    NoModels(TaskKind),

    #[error("Model '{0}' must allow at least one concurrent task")]
    InvalidModelCapacity(String),

    #[error("Duplicate model id '{0}'")]
    DuplicateModel(String),
}

/// Validate settings before wiring the pipeline.
pub fn validate_settings(settings: &StudioSettings) -> Result<(), SettingsError> {
    if !(1..=10).contains(&settings.lines_per_anchor) {
        return Err(SettingsError::InvalidLinesPerAnchor(
            settings.lines_per_anchor,
        ));
    }
    if settings.max_parallel_prep == 0 {
        return Err(SettingsError::InvalidParallelPrep);
    }
    if settings.handshake_attempts == 0 {
        return Err(SettingsError::InvalidHandshakeAttempts);
    }
    if settings.handshake_timeout_ms == 0 {
        return Err(SettingsError::InvalidHandshakeTimeout);
    }

    for kind in TaskKind::ALL {
        let models = settings.models.models_for(kind);
        if models.is_empty() {
            return Err(SettingsError::NoModels(kind));
        }
        for (i, model) in models.iter().enumerate() {
            if model.max_concurrent == 0 {
                return Err(SettingsError::InvalidModelCapacity(model.id.clone()));
            }
            if models[..i].iter().any(|m| m.id == model.id) {
                return Err(SettingsError::DuplicateModel(model.id.clone()));
            }
        }
    }

    Ok(())
}
