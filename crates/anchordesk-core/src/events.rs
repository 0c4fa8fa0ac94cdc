//! Canonical event union for everything the pipeline shows to a viewer.
//!
//! A rendering layer (terminal, web page, desktop shell) subscribes through
//! [`StudioEventEmitter`](crate::ports::StudioEventEmitter) and draws these.
//!
//! # Wire Format
//!
//! ```json
//! { "type": "speaker_changed", "speaker": "A" }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{BroadcastPhase, QueueItem, Speaker};

/// Intro or outro overlay shown around a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Intro,
    Outro,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StudioEvent {
    // ========== Status ==========
    /// Status-line text.
    Status { message: String },

    /// The orchestrator entered a new phase.
    PhaseChanged {
        broadcast_id: Option<String>,
        phase: BroadcastPhase,
    },

    /// Loading spinner/progress panel visibility.
    LoadingVisibility { visible: bool },

    /// Studio panel visibility.
    StudioVisibility { visible: bool },

    /// The coordinator could not be reached; playback continues locally.
    OfflineMode { broadcast_id: String },

    // ========== Loading ==========
    /// Speech synthesis progress.
    SynthesisProgress {
        loaded: usize,
        total: usize,
        percent: u8,
    },

    /// Estimated seconds until playback starts.
    Countdown { remaining_secs: u64 },

    /// Transient "loading canceled" indicator.
    CanceledIndicator { visible: bool },

    // ========== Playback ==========
    /// Breaking-news banner text for the current broadcast.
    BreakingNews { topic: String },

    Overlay { kind: OverlayKind, visible: bool },

    /// The active anchor changed.
    SpeakerChanged { speaker: Speaker },

    /// Caption for the segment about to play (already sanitized).
    Caption { speaker: Speaker, text: String },

    /// A segment had no playable audio and was skipped.
    SegmentSkipped { index: usize },

    /// Playback of a bundle finished.
    PlaybackFinished {
        played: usize,
        skipped: usize,
        halted: bool,
    },

    // ========== Library / queue ==========
    BroadcastSaved { broadcast_id: String },

    /// Snapshot of the preparation queue.
    QueueChanged { items: Vec<QueueItem> },
}

impl StudioEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn progress(loaded: usize, total: usize) -> Self {
        Self::SynthesisProgress {
            loaded,
            total,
            percent: percent(loaded, total),
        }
    }

    /// `domain:action` name used by adapters that route on event names.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Status { .. } => "studio:status",
            Self::PhaseChanged { .. } => "studio:phase",
            Self::LoadingVisibility { .. } => "studio:loading",
            Self::StudioVisibility { .. } => "studio:visibility",
            Self::OfflineMode { .. } => "studio:offline",
            Self::SynthesisProgress { .. } => "loading:progress",
            Self::Countdown { .. } => "loading:countdown",
            Self::CanceledIndicator { .. } => "loading:canceled",
            Self::BreakingNews { .. } => "playback:breaking_news",
            Self::Overlay { .. } => "playback:overlay",
            Self::SpeakerChanged { .. } => "playback:speaker",
            Self::Caption { .. } => "playback:caption",
            Self::SegmentSkipped { .. } => "playback:skipped",
            Self::PlaybackFinished { .. } => "playback:finished",
            Self::BroadcastSaved { .. } => "library:saved",
            Self::QueueChanged { .. } => "queue:changed",
        }
    }
}

/// Integer percentage, 0 for an empty total.
#[allow(clippy::cast_possible_truncation)]
pub const fn percent(loaded: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = loaded.saturating_mul(100) / total;
    if pct > 100 { 100 } else { pct as u8 }
}
