//! Speech synthesis task.
//!
//! One dispatcher submission per dialogue line. Lines complete in any order;
//! results are collected as `(index, segment)` pairs and re-sorted, so the
//! bundle is always index-aligned with the dialogue.
//!
//! # Failure handling
//!
//! - A clip that renders but never becomes playable (error or load timeout)
//!   is kept with an unusable handle; playback skips it.
//! - A line whose synthesis fails becomes a missing segment, also skipped.
//! - Only when every line fails does the whole bundle fail.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use anchordesk_core::ports::{AudioOutputPort, SpeechSynthesisPort};
use anchordesk_core::{
    AudioBundle, AudioHandle, AudioSegment, DialogueLine, StudioError, StudioResult, TaskKind,
    Voice,
};

use crate::dispatcher::TaskDispatcher;

pub struct SpeechSynthesizer {
    dispatcher: Arc<TaskDispatcher>,
    tts: Arc<dyn SpeechSynthesisPort>,
    audio: Arc<dyn AudioOutputPort>,
    load_timeout: Duration,
}

impl SpeechSynthesizer {
    pub fn new(
        dispatcher: Arc<TaskDispatcher>,
        tts: Arc<dyn SpeechSynthesisPort>,
        audio: Arc<dyn AudioOutputPort>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            dispatcher,
            tts,
            audio,
            load_timeout,
        }
    }

    /// Render one line and wait until its clip can play.
    ///
    /// The returned handle is marked unusable when loading fails or takes
    /// longer than the load timeout.
    pub async fn synthesize_line(
        &self,
        index: usize,
        line: &DialogueLine,
    ) -> StudioResult<AudioHandle> {
        let voice = Voice::for_speaker(line.speaker);
        let tts = Arc::clone(&self.tts);
        let text = line.text.clone();
        let params = json!({ "index": index, "voice": voice, "chars": text.len() });

        let handle = self
            .dispatcher
            .submit(TaskKind::Speech, params, move |model_id| async move {
                tts.synthesize(&model_id, &text, voice)
                    .await
                    .map_err(|e| StudioError::synthesis(e.to_string()))
            })
            .await?;

        match tokio::time::timeout(self.load_timeout, self.audio.wait_playable(&handle)).await {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(error)) => {
                warn!(target: "anchordesk.speech", index, %error, "Clip failed to load");
                Ok(handle.unusable())
            }
            Err(_) => {
                warn!(
                    target: "anchordesk.speech",
                    index,
                    timeout_ms = self.load_timeout.as_millis() as u64,
                    "Clip load timed out"
                );
                Ok(handle.unusable())
            }
        }
    }

    /// Render every line concurrently, reporting `(loaded, total)` after each
    /// completion.
    ///
    /// Returns [`StudioError::Cancelled`] as soon as `cancel` fires; work
    /// already handed to the dispatcher finishes in the background and frees
    /// its slots.
    pub async fn synthesize_all<P>(
        &self,
        lines: &[DialogueLine],
        cancel: &CancellationToken,
        mut progress: P,
    ) -> StudioResult<AudioBundle>
    where
        P: FnMut(usize, usize) + Send,
    {
        if lines.is_empty() {
            return Err(StudioError::synthesis("no dialogue lines to synthesize"));
        }
        if cancel.is_cancelled() {
            return Err(StudioError::Cancelled);
        }

        let total = lines.len();
        let mut pending: FuturesUnordered<_> = lines
            .iter()
            .enumerate()
            .map(|(index, line)| async move { (index, self.synthesize_line(index, line).await) })
            .collect();

        let mut segments = Vec::with_capacity(total);
        let mut failures = 0usize;
        let mut last_error = None;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(target: "anchordesk.speech", loaded = segments.len(), total, "Synthesis canceled");
                    return Err(StudioError::Cancelled);
                }
                next = pending.next() => next,
            };
            let Some((index, result)) = next else {
                break;
            };

            let line = &lines[index];
            let segment = match result {
                Ok(handle) => AudioSegment::rendered(line, handle),
                Err(error) => {
                    warn!(target: "anchordesk.speech", index, %error, "Line synthesis failed, segment will be skipped");
                    failures += 1;
                    last_error = Some(error);
                    AudioSegment::missing(line)
                }
            };
            segments.push((index, segment));
            progress(segments.len(), total);
        }

        if cancel.is_cancelled() {
            return Err(StudioError::Cancelled);
        }
        if failures == total {
            return Err(last_error
                .unwrap_or_else(|| StudioError::synthesis("every line failed to synthesize")));
        }

        let bundle = AudioBundle::from_indexed(segments);
        info!(
            target: "anchordesk.speech",
            total,
            playable = bundle.playable_count(),
            "Synthesis complete"
        );
        Ok(bundle)
    }
}
