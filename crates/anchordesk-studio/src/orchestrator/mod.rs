//! Broadcast orchestration shared by the studio and the feed.
//!
//! Both orchestrators drive one attempt at a time through the phase machine
//! held by [`StudioState`]:
//!
//! ```text
//!   Locking → Handshake → [Generating] → Synthesizing → Playing → Complete
//!                                                          │
//!                                  (queued chain) Handshake ◄┘
//! ```
//!
//! [`BroadcastPipeline`] owns the stages both variants share (synthesis with
//! progress, presentation, and teardown), and the single guard that admits
//! attempts. Share one pipeline between orchestrators so the studio and the
//! feed cannot play at the same time.
//!
//! # Teardown
//!
//! [`BroadcastPipeline::conclude`] runs on every exit path. It stops all
//! audio, hides the studio, reports the outcome to the coordinator, and
//! returns the guard to rest. A user cancel during loading keeps the guard
//! armed through the cleanup delay so an immediate restart is rejected as
//! busy instead of racing the teardown.

mod feed;
mod studio;

pub use feed::{FEED_FAILURE_PHASE, FeedOrchestrator};
pub use studio::{QUEUED_FAILURE_PHASE, STUDIO_FAILURE_PHASE, StudioOrchestrator};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use anchordesk_core::contracts::coordinator::EndStats;
use anchordesk_core::{
    AudioBundle, AudioOutputPort, BroadcastPhase, DialogueLine, OverlayKind, StudioError,
    StudioEvent, StudioEventEmitter, StudioResult, StudioSettings,
};
use anchordesk_dispatch::SpeechSynthesizer;
use anchordesk_handshake::HandshakeClient;

use crate::countdown::Countdown;
use crate::playback::{PlaybackEngine, PlaybackReport};
use crate::state::{Admission, Attempt, StateSnapshot, StopKind, StudioState};

pub const CANCELED_STATUS: &str = "Broadcast loading canceled by user";

const CANCELED_ERROR: &str = "Canceled by user";

/// How a broadcast attempt ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BroadcastOutcome {
    /// Played to the end, followed by `chained` queued broadcasts.
    Completed {
        report: PlaybackReport,
        chained: usize,
    },
    /// Stopped by the user after playback began.
    Stopped,
    /// Canceled by the user while loading.
    Canceled,
}

/// Stages and guard shared by every orchestrator.
pub struct BroadcastPipeline {
    state: StudioState,
    handshake: Arc<HandshakeClient>,
    speech: Arc<SpeechSynthesizer>,
    playback: PlaybackEngine,
    audio: Arc<dyn AudioOutputPort>,
    emitter: Arc<dyn StudioEventEmitter>,
    overlay: Duration,
    cancel_cleanup: Duration,
    canceled_indicator: Duration,
}

impl BroadcastPipeline {
    pub fn new(
        handshake: Arc<HandshakeClient>,
        speech: Arc<SpeechSynthesizer>,
        audio: Arc<dyn AudioOutputPort>,
        emitter: Arc<dyn StudioEventEmitter>,
        settings: &StudioSettings,
    ) -> Self {
        Self {
            state: StudioState::new(Arc::clone(&emitter)),
            handshake,
            speech,
            playback: PlaybackEngine::new(
                Arc::clone(&audio),
                Arc::clone(&emitter),
                settings.segment_gap(),
            ),
            audio,
            emitter,
            overlay: settings.overlay(),
            cancel_cleanup: settings.cancel_cleanup(),
            canceled_indicator: settings.canceled_indicator(),
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    pub fn handshake(&self) -> &HandshakeClient {
        &self.handshake
    }

    /// Stop whatever is running.
    ///
    /// While loading this is a cancel: the attempt unwinds at its next
    /// checkpoint. During playback the current segment is cut short.
    pub fn stop(&self) -> StopKind {
        let kind = self.state.request_stop();
        if kind != StopKind::Idle {
            self.audio.stop_all();
            info!(target: "anchordesk.studio", ?kind, "Stop requested");
        }
        kind
    }

    /// Cancel an attempt that is still loading. Returns `false` when nothing
    /// was loading.
    pub fn cancel_loading(&self) -> bool {
        if !self.state.guard().is_loading {
            debug!(target: "anchordesk.studio", "No broadcast loading to cancel");
            return false;
        }
        self.stop() == StopKind::Loading
    }

    pub(crate) fn status(&self, message: impl Into<String>) {
        self.emitter.emit(StudioEvent::status(message));
    }

    pub(crate) fn emit(&self, event: StudioEvent) {
        self.emitter.emit(event);
    }

    pub(crate) fn emitter(&self) -> Arc<dyn StudioEventEmitter> {
        Arc::clone(&self.emitter)
    }

    /// Take the guard for `id`. `None` means the request stopped the
    /// broadcast already playing under that id.
    pub(crate) fn admit(&self, id: &str) -> StudioResult<Option<Attempt>> {
        match self.state.admit(id) {
            Ok(Admission::Granted(attempt)) => {
                self.emit(StudioEvent::LoadingVisibility { visible: true });
                Ok(Some(attempt))
            }
            Ok(Admission::StopRequested) => {
                self.stop();
                Ok(None)
            }
            Err(error) => {
                debug!(target: "anchordesk.studio", broadcast_id = id, %error, "Start rejected");
                self.status(error.user_message());
                Err(error)
            }
        }
    }

    pub(crate) fn transition(&self, next: BroadcastPhase) -> StudioResult<()> {
        self.state.transition(next)
    }

    pub(crate) fn phase(&self) -> BroadcastPhase {
        self.state.phase()
    }

    pub(crate) fn checkpoint(attempt: &Attempt) -> StudioResult<()> {
        if attempt.cancel.is_cancelled() {
            return Err(StudioError::Cancelled);
        }
        Ok(())
    }

    /// Render `dialogue`, reporting progress to the sink and the countdown.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) async fn synthesize(
        &self,
        attempt: &Attempt,
        dialogue: &[DialogueLine],
        countdown: Option<&Countdown>,
    ) -> StudioResult<AudioBundle> {
        Self::checkpoint(attempt)?;
        self.status("Loading voice audio...");
        let emitter = &self.emitter;
        let progress = |loaded: usize, total: usize| {
            emitter.emit(StudioEvent::progress(loaded, total));
            if let Some(countdown) = countdown {
                countdown.recalibrate(loaded as f64 / total as f64);
            }
        };
        let bundle = self
            .speech
            .synthesize_all(dialogue, &attempt.cancel, progress)
            .await?;
        Self::checkpoint(attempt)?;
        Ok(bundle)
    }

    /// Put a rendered bundle on air: live notice, intro, playback, outro.
    pub(crate) async fn present(
        &self,
        attempt: &Attempt,
        topic: &str,
        bundle: &AudioBundle,
    ) -> StudioResult<PlaybackReport> {
        self.transition(BroadcastPhase::Playing)?;
        self.emit(StudioEvent::LoadingVisibility { visible: false });
        self.emit(StudioEvent::StudioVisibility { visible: true });
        self.handshake.notify_live(topic, bundle.len()).await;

        self.overlay(OverlayKind::Intro, &attempt.cancel).await;
        self.emit(StudioEvent::BreakingNews {
            topic: topic.to_string(),
        });
        self.status(format!("Now broadcasting: {topic}"));

        let report = self.playback.play(bundle, &attempt.cancel).await;
        if !report.halted {
            self.overlay(OverlayKind::Outro, &attempt.cancel).await;
        }
        Ok(report)
    }

    async fn overlay(&self, kind: OverlayKind, cancel: &CancellationToken) {
        self.emit(StudioEvent::Overlay {
            kind,
            visible: true,
        });
        tokio::select! {
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(self.overlay) => {}
        }
        self.emit(StudioEvent::Overlay {
            kind,
            visible: false,
        });
    }

    /// Report a broadcast that reached playback.
    pub(crate) async fn report_played(&self, topic: &str, report: &PlaybackReport) {
        let mut stats = EndStats::success()
            .with_topic(topic)
            .with_lines_played(report.played);
        if report.halted {
            stats = stats.ended_by("user_close");
        }
        self.handshake.notify_end(stats).await;
    }

    /// Tear down the attempt and return the guard to rest.
    pub(crate) async fn conclude(
        &self,
        attempt: &Attempt,
        topic: &str,
        result: StudioResult<BroadcastOutcome>,
        failure_phase: &str,
    ) -> StudioResult<BroadcastOutcome> {
        self.audio.stop_all();
        self.emit(StudioEvent::LoadingVisibility { visible: false });
        self.emit(StudioEvent::StudioVisibility { visible: false });

        let concluded = match result {
            Ok(outcome) => {
                let terminal = if self.phase().can_transition_to(BroadcastPhase::Complete) {
                    BroadcastPhase::Complete
                } else if matches!(outcome, BroadcastOutcome::Stopped) {
                    BroadcastPhase::Canceled
                } else {
                    BroadcastPhase::Failed
                };
                self.settle(terminal);
                if matches!(outcome, BroadcastOutcome::Stopped) {
                    self.status("Broadcast stopped");
                } else {
                    self.status("Broadcast complete");
                }
                Ok(outcome)
            }
            Err(StudioError::Cancelled) if self.state.was_canceled() => {
                self.settle(BroadcastPhase::Canceled);
                info!(target: "anchordesk.studio", broadcast_id = %attempt.id, "Broadcast loading canceled");
                self.status(CANCELED_STATUS);
                self.handshake
                    .notify_end(
                        EndStats::failure(CANCELED_ERROR, failure_phase)
                            .with_topic(topic)
                            .canceled(),
                    )
                    .await;
                self.show_canceled_indicator();
                // Still armed: a start during cleanup is rejected as busy.
                tokio::time::sleep(self.cancel_cleanup).await;
                Ok(BroadcastOutcome::Canceled)
            }
            Err(StudioError::Cancelled) => {
                self.settle(BroadcastPhase::Canceled);
                self.handshake
                    .notify_end(
                        EndStats::failure("Stopped by user", failure_phase)
                            .with_topic(topic)
                            .canceled()
                            .ended_by("user_close"),
                    )
                    .await;
                self.status("Broadcast stopped");
                Ok(BroadcastOutcome::Stopped)
            }
            Err(error) => {
                self.settle(BroadcastPhase::Failed);
                warn!(
                    target: "anchordesk.studio",
                    broadcast_id = %attempt.id,
                    phase = failure_phase,
                    %error,
                    "Broadcast failed"
                );
                self.status(error.user_message());
                self.handshake
                    .notify_end(EndStats::failure(error.to_string(), failure_phase).with_topic(topic))
                    .await;
                Err(error)
            }
        };

        self.state.finish();
        concluded
    }

    fn settle(&self, terminal: BroadcastPhase) {
        if let Err(error) = self.transition(terminal) {
            debug!(target: "anchordesk.studio", %error, "Terminal phase not recorded");
        }
    }

    fn show_canceled_indicator(&self) {
        self.emit(StudioEvent::CanceledIndicator { visible: true });
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let emitter = Arc::clone(&self.emitter);
        let lifetime = self.canceled_indicator;
        runtime.spawn(async move {
            tokio::time::sleep(lifetime).await;
            emitter.emit(StudioEvent::CanceledIndicator { visible: false });
        });
    }
}
