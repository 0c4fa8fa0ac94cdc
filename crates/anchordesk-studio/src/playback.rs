//! Sequential segment playback.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use anchordesk_core::sanitize::sanitize_html;
use anchordesk_core::{AudioBundle, AudioOutputPort, StudioEvent, StudioEventEmitter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub played: usize,
    pub skipped: usize,
    /// A stop request ended playback early.
    pub halted: bool,
}

/// Plays a bundle one segment at a time.
///
/// Segments without a playable handle are skipped with a warning. A stop
/// request is observed while a segment plays and during the gap after it;
/// the engine then stops every clip and returns what it got through.
pub struct PlaybackEngine {
    audio: Arc<dyn AudioOutputPort>,
    emitter: Arc<dyn StudioEventEmitter>,
    segment_gap: Duration,
}

impl PlaybackEngine {
    pub fn new(
        audio: Arc<dyn AudioOutputPort>,
        emitter: Arc<dyn StudioEventEmitter>,
        segment_gap: Duration,
    ) -> Self {
        Self {
            audio,
            emitter,
            segment_gap,
        }
    }

    pub async fn play(&self, bundle: &AudioBundle, stop: &CancellationToken) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        let last = bundle.len().saturating_sub(1);

        for (index, segment) in bundle.segments().iter().enumerate() {
            if stop.is_cancelled() {
                report.halted = true;
                break;
            }

            let Some(handle) = segment.playable_handle() else {
                warn!(target: "anchordesk.playback", index, "No playable audio, skipping segment");
                self.emitter.emit(StudioEvent::SegmentSkipped { index });
                report.skipped += 1;
                continue;
            };

            self.emitter.emit(StudioEvent::SpeakerChanged {
                speaker: segment.speaker,
            });
            self.emitter.emit(StudioEvent::Caption {
                speaker: segment.speaker,
                text: sanitize_html(&segment.text),
            });

            tokio::select! {
                biased;
                () = stop.cancelled() => {
                    self.audio.stop_all();
                    report.halted = true;
                    break;
                }
                result = self.audio.play(handle) => match result {
                    Ok(()) => report.played += 1,
                    Err(error) => {
                        warn!(target: "anchordesk.playback", index, %error, "Segment playback failed");
                        report.skipped += 1;
                    }
                },
            }

            if index < last {
                tokio::select! {
                    biased;
                    () = stop.cancelled() => {
                        report.halted = true;
                        break;
                    }
                    () = tokio::time::sleep(self.segment_gap) => {}
                }
            }
        }

        debug!(
            target: "anchordesk.playback",
            played = report.played,
            skipped = report.skipped,
            halted = report.halted,
            "Playback finished"
        );
        self.emitter.emit(StudioEvent::PlaybackFinished {
            played: report.played,
            skipped: report.skipped,
            halted: report.halted,
        });
        report
    }
}
