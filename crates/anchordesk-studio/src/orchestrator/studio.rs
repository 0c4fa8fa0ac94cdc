//! Studio broadcasts: a fresh topic generated, voiced, and played live.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use anchordesk_core::contracts::coordinator::EndStats;
use anchordesk_core::sanitize::{
    BLOCKED_TOPIC_PLACEHOLDER, contains_blocked_media_urls, ensure_broadcastable,
    sanitize_dialogue, sanitize_topic,
};
use anchordesk_core::{
    BroadcastLibrary, BroadcastPhase, DialogueLine, DialogueRequest, QueueItem, StudioError,
    StudioEvent, StudioResult, StudioSettings, Visibility,
};
use anchordesk_dispatch::DialogueGenerator;
use anchordesk_handshake::HandshakeRequest;

use super::{BroadcastOutcome, BroadcastPipeline};
use crate::countdown::{Countdown, estimate_loading_secs};
use crate::queue::QueueManager;
use crate::state::Attempt;

/// Phase reported to the coordinator when a studio broadcast fails.
pub const STUDIO_FAILURE_PHASE: &str = "preparation";

/// Phase reported when a queued broadcast cannot be chained.
pub const QUEUED_FAILURE_PHASE: &str = "queued_transition";

pub struct StudioOrchestrator {
    pipeline: Arc<BroadcastPipeline>,
    dialogue: Arc<DialogueGenerator>,
    queue: Arc<QueueManager>,
    library: BroadcastLibrary,
    owner: String,
    template: DialogueRequest,
    ready_pause: Duration,
}

impl StudioOrchestrator {
    pub fn new(
        pipeline: Arc<BroadcastPipeline>,
        dialogue: Arc<DialogueGenerator>,
        queue: Arc<QueueManager>,
        library: BroadcastLibrary,
        owner: impl Into<String>,
        settings: &StudioSettings,
    ) -> Self {
        Self {
            pipeline,
            dialogue,
            queue,
            library,
            owner: owner.into(),
            template: DialogueRequest::new(String::new(), settings.lines_per_anchor)
                .with_tone(settings.tone)
                .with_personalities(settings.personality_a, settings.personality_b),
            ready_pause: settings.ready_pause(),
        }
    }

    pub fn pipeline(&self) -> &BroadcastPipeline {
        &self.pipeline
    }

    pub fn queue(&self) -> &Arc<QueueManager> {
        &self.queue
    }

    /// Generate and play a broadcast on `topic`, then any ready queued ones.
    ///
    /// Rejected with [`StudioError::Busy`] while another broadcast holds the
    /// guard. A user cancel or stop is an `Ok` outcome.
    pub async fn start(&self, topic: &str, visibility: Visibility) -> StudioResult<BroadcastOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            self.pipeline.status("Please enter a topic");
            return Err(StudioError::validation("Please enter a topic"));
        }

        let id = format!("studio-{}", Uuid::new_v4());
        let Some(attempt) = self.pipeline.admit(&id)? else {
            return Ok(BroadcastOutcome::Stopped);
        };
        info!(target: "anchordesk.studio", attempt_id = %attempt.id, %visibility, "Studio broadcast admitted");

        let result = self.run(&attempt, topic, visibility).await;
        self.pipeline
            .conclude(&attempt, topic, result, STUDIO_FAILURE_PHASE)
            .await
    }

    async fn run(
        &self,
        attempt: &Attempt,
        topic: &str,
        visibility: Visibility,
    ) -> StudioResult<BroadcastOutcome> {
        if contains_blocked_media_urls(topic) {
            return Err(StudioError::content_policy(
                "Your topic contains URLs to media hosting sites which are not allowed.",
            ));
        }
        let topic = sanitize_topic(topic);
        if topic.trim().is_empty() || topic == BLOCKED_TOPIC_PLACEHOLDER {
            return Err(StudioError::content_policy("topic is empty after sanitization"));
        }

        self.pipeline.transition(BroadcastPhase::Handshake)?;
        self.pipeline.status("Initiating broadcast handshake...");
        self.pipeline
            .handshake()
            .negotiate(HandshakeRequest::new(&topic, visibility))
            .await?;
        BroadcastPipeline::checkpoint(attempt)?;

        self.pipeline.transition(BroadcastPhase::Generating)?;
        let request = DialogueRequest {
            topic: topic.clone(),
            ..self.template.clone()
        };
        let countdown = Countdown::start(
            estimate_loading_secs(request.total_line_count(), topic.chars().count()),
            self.pipeline.emitter(),
        );
        self.pipeline.status("Generating news dialogue...");
        let dialogue = tokio::select! {
            biased;
            () = attempt.cancel.cancelled() => return Err(StudioError::Cancelled),
            generated = self.dialogue.generate(&request) => generated?,
        };
        ensure_broadcastable(&topic, &sanitize_dialogue(&dialogue))?;
        self.save(&topic, &dialogue, visibility).await;

        self.pipeline.transition(BroadcastPhase::Synthesizing)?;
        let bundle = self
            .pipeline
            .synthesize(attempt, &dialogue, Some(&countdown))
            .await?;
        drop(countdown);

        let report = self.pipeline.present(attempt, &topic, &bundle).await?;
        self.pipeline.report_played(&topic, &report).await;
        if report.halted {
            return Ok(BroadcastOutcome::Stopped);
        }

        let chained = self.play_queued(attempt, visibility).await?;
        if attempt.cancel.is_cancelled() {
            return Ok(BroadcastOutcome::Stopped);
        }
        Ok(BroadcastOutcome::Completed { report, chained })
    }

    /// Play ready queue items back to back. A queued broadcast whose
    /// handshake fails is reported and dropped, and the chain moves on.
    /// A stop in the pause between items ends the chain cleanly; the
    /// previous broadcast has already reported its end.
    async fn play_queued(&self, attempt: &Attempt, visibility: Visibility) -> StudioResult<usize> {
        let mut chained = 0;
        loop {
            if self.queue.peek_ready().is_none() {
                return Ok(chained);
            }
            tokio::select! {
                biased;
                () = attempt.cancel.cancelled() => return Ok(chained),
                () = tokio::time::sleep(self.ready_pause) => {}
            }
            let Some(item) = self.queue.take_ready() else {
                return Ok(chained);
            };

            if self.pipeline.phase() != BroadcastPhase::Handshake {
                self.pipeline.transition(BroadcastPhase::Handshake)?;
            }
            if let Some(halted) = self.play_item(attempt, &item, visibility).await? {
                chained += 1;
                if halted {
                    return Ok(chained);
                }
            }
        }
    }

    /// `Some(halted)` once the item played, `None` when it was dropped.
    async fn play_item(
        &self,
        attempt: &Attempt,
        item: &QueueItem,
        visibility: Visibility,
    ) -> StudioResult<Option<bool>> {
        let (Some(dialogue), Some(bundle)) = (&item.dialogue, &item.audio) else {
            return Ok(None);
        };

        self.pipeline.status("Initiating handshake for queued broadcast...");
        let negotiated = self
            .pipeline
            .handshake()
            .negotiate(
                HandshakeRequest::new(&item.topic, visibility)
                    .with_id(format!("queued-{}", item.id))
                    .queued(),
            )
            .await;
        if let Err(error) = negotiated {
            warn!(target: "anchordesk.studio", item_id = %item.id, %error, "Queued broadcast dropped");
            self.pipeline
                .handshake()
                .notify_end(
                    EndStats::failure(error.to_string(), QUEUED_FAILURE_PHASE)
                        .with_topic(&item.topic),
                )
                .await;
            return Ok(None);
        }
        BroadcastPipeline::checkpoint(attempt)?;

        self.save(&item.topic, dialogue, visibility).await;
        self.pipeline.transition(BroadcastPhase::Synthesizing)?;
        self.pipeline
            .status(format!("Starting queued broadcast: {}", item.topic));

        let report = self.pipeline.present(attempt, &item.topic, bundle).await?;
        self.pipeline.report_played(&item.topic, &report).await;
        info!(target: "anchordesk.studio", item_id = %item.id, played = report.played, "Queued broadcast played");
        Ok(Some(report.halted))
    }

    /// Save to the library. A failed save does not stop the broadcast.
    async fn save(&self, topic: &str, dialogue: &[DialogueLine], visibility: Visibility) {
        match self.library.save(&self.owner, topic, dialogue, visibility).await {
            Ok(saved) => {
                self.pipeline.emit(StudioEvent::BroadcastSaved {
                    broadcast_id: saved.id,
                });
            }
            Err(error) => {
                warn!(target: "anchordesk.studio", %error, "Broadcast not saved, continuing");
            }
        }
    }
}
