//! Feed playback: a saved broadcast re-voiced and played on request.

use std::sync::Arc;

use tracing::{info, warn};

use anchordesk_core::sanitize::{ensure_broadcastable, sanitize_broadcast};
use anchordesk_core::{Broadcast, BroadcastLibrary, BroadcastPhase, StudioEvent, StudioResult};
use anchordesk_handshake::HandshakeRequest;

use super::{BroadcastOutcome, BroadcastPipeline};
use crate::state::Attempt;

/// Phase reported to the coordinator when feed playback fails.
pub const FEED_FAILURE_PHASE: &str = "feed_playback";

/// Plays saved broadcasts.
///
/// The guard is keyed by broadcast id, so playing the broadcast already on
/// air stops it. The dialogue exists already, so the handshake leads straight
/// to synthesis, and a coordinator that never acknowledges only puts the
/// feed in offline mode.
pub struct FeedOrchestrator {
    pipeline: Arc<BroadcastPipeline>,
    library: BroadcastLibrary,
}

impl FeedOrchestrator {
    pub fn new(pipeline: Arc<BroadcastPipeline>, library: BroadcastLibrary) -> Self {
        Self { pipeline, library }
    }

    pub fn pipeline(&self) -> &BroadcastPipeline {
        &self.pipeline
    }

    /// Look up a broadcast `requester` may see, then play it.
    pub async fn play_saved(
        &self,
        id: &str,
        requester: Option<&str>,
    ) -> StudioResult<BroadcastOutcome> {
        let broadcast = self.library.get(id, requester).await?;
        self.play(&broadcast).await
    }

    pub async fn play(&self, broadcast: &Broadcast) -> StudioResult<BroadcastOutcome> {
        let Some(attempt) = self.pipeline.admit(&broadcast.id)? else {
            return Ok(BroadcastOutcome::Stopped);
        };
        info!(target: "anchordesk.feed", broadcast_id = %broadcast.id, "Feed playback admitted");

        let result = self.run(&attempt, broadcast).await;
        self.pipeline
            .conclude(&attempt, &broadcast.topic, result, FEED_FAILURE_PHASE)
            .await
    }

    async fn run(&self, attempt: &Attempt, broadcast: &Broadcast) -> StudioResult<BroadcastOutcome> {
        let clean = sanitize_broadcast(broadcast);
        ensure_broadcastable(&clean.topic, &clean.dialogue)?;

        self.pipeline.transition(BroadcastPhase::Handshake)?;
        self.pipeline.status("Initiating broadcast handshake...");
        let negotiated = self
            .pipeline
            .handshake()
            .negotiate(
                HandshakeRequest::new(&clean.topic, clean.visibility)
                    .with_id(format!("feed-{}", clean.id)),
            )
            .await;
        if let Err(error) = negotiated {
            warn!(target: "anchordesk.feed", broadcast_id = %clean.id, %error, "Handshake failed, playing offline");
            self.pipeline.emit(StudioEvent::OfflineMode {
                broadcast_id: clean.id.clone(),
            });
            self.pipeline.status("Coordinator unavailable, playing in offline mode");
        }
        BroadcastPipeline::checkpoint(attempt)?;

        self.pipeline.transition(BroadcastPhase::Synthesizing)?;
        let bundle = self.pipeline.synthesize(attempt, &clean.dialogue, None).await?;

        let report = self.pipeline.present(attempt, &clean.topic, &bundle).await?;
        self.pipeline.report_played(&clean.topic, &report).await;
        if report.halted {
            return Ok(BroadcastOutcome::Stopped);
        }
        Ok(BroadcastOutcome::Completed { report, chained: 0 })
    }
}
