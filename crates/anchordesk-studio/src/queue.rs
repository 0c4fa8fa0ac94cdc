//! Preparation queue for follow-up broadcasts.
//!
//! Topics are generated and synthesized ahead of time so the studio can chain
//! them without a loading pause.
//!
//! # Concurrency Model
//!
//! - At most `max_parallel` preparations run at once. Each holds a slot
//!   guard; dropping the guard frees the slot and starts the next
//!   `preparing` item in queue order, on every exit path.
//! - Items, the in-flight count, and per-item cancel tokens share one
//!   `std::sync::Mutex`, never held across an `.await`.
//! - Removing an item cancels its preparation; results for an item that is
//!   no longer queued are discarded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use anchordesk_core::sanitize::{contains_blocked_media_urls, sanitize_topic};
use anchordesk_core::{
    AudioBundle, DialogueRequest, QueueItem, QueueItemStatus, QueueStatus,
    StudioError, StudioEvent, StudioEventEmitter, StudioResult, StudioSettings,
};
use anchordesk_dispatch::{DialogueGenerator, SpeechSynthesizer};

#[derive(Default)]
struct Inner {
    items: Vec<QueueItem>,
    in_flight: usize,
    cancels: HashMap<String, CancellationToken>,
}

impl Inner {
    fn find_mut(&mut self, id: &str) -> Option<&mut QueueItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn resequence(&mut self) {
        for (position, item) in self.items.iter_mut().enumerate() {
            item.position = position;
        }
    }
}

pub struct QueueManager {
    inner: Mutex<Inner>,
    dialogue: Arc<DialogueGenerator>,
    speech: Arc<SpeechSynthesizer>,
    emitter: Arc<dyn StudioEventEmitter>,
    template: DialogueRequest,
    max_parallel: usize,
}

impl QueueManager {
    pub fn new(
        dialogue: Arc<DialogueGenerator>,
        speech: Arc<SpeechSynthesizer>,
        emitter: Arc<dyn StudioEventEmitter>,
        settings: &StudioSettings,
    ) -> Self {
        let template = DialogueRequest::new(String::new(), settings.lines_per_anchor)
            .with_tone(settings.tone)
            .with_personalities(settings.personality_a, settings.personality_b);
        Self {
            inner: Mutex::new(Inner::default()),
            dialogue,
            speech,
            emitter,
            template,
            max_parallel: settings.max_parallel_prep.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        let items = self.lock().items.clone();
        self.emitter.emit(StudioEvent::QueueChanged { items });
    }

    /// Append a topic and start preparing it if a slot is free.
    pub fn enqueue(self: &Arc<Self>, topic: &str) -> StudioResult<QueueItem> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StudioError::validation("Please enter a topic"));
        }
        if contains_blocked_media_urls(topic) {
            return Err(StudioError::content_policy(
                "Your topic contains URLs to media hosting sites which are not allowed.",
            ));
        }
        let topic = sanitize_topic(topic);
        if topic.trim().is_empty() {
            return Err(StudioError::content_policy("topic is empty after sanitization"));
        }

        let item = {
            let mut inner = self.lock();
            let item = QueueItem::new(topic, inner.items.len());
            inner.items.push(item.clone());
            item
        };
        info!(target: "anchordesk.queue", item_id = %item.id, topic = %item.topic, "Topic queued");
        self.publish();
        self.drain_preparation();
        Ok(item)
    }

    /// Start `preparing` items in queue order until the parallel cap is hit.
    pub fn drain_preparation(self: &Arc<Self>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let started: Vec<(String, String, CancellationToken)> = {
            let mut inner = self.lock();
            let mut started = Vec::new();
            while inner.in_flight < self.max_parallel {
                let Some(item) = inner
                    .items
                    .iter_mut()
                    .find(|item| item.status == QueueItemStatus::Preparing)
                else {
                    break;
                };
                item.status = QueueItemStatus::Generating;
                let id = item.id.clone();
                let topic = item.topic.clone();
                let cancel = CancellationToken::new();
                inner.cancels.insert(id.clone(), cancel.clone());
                inner.in_flight += 1;
                started.push((id, topic, cancel));
            }
            started
        };
        if started.is_empty() {
            return;
        }

        self.publish();
        for (id, topic, cancel) in started {
            let slot = PrepSlot {
                manager: Arc::clone(self),
                item_id: id.clone(),
            };
            let manager = Arc::clone(self);
            runtime.spawn(async move {
                let _slot = slot;
                manager.prepare(&id, &topic, &cancel).await;
            });
        }
    }

    async fn prepare(&self, id: &str, topic: &str, cancel: &CancellationToken) {
        debug!(target: "anchordesk.queue", item_id = id, "Preparing");
        let request = DialogueRequest {
            topic: topic.to_string(),
            ..self.template.clone()
        };

        let dialogue = match self.dialogue.generate(&request).await {
            Ok(dialogue) => dialogue,
            Err(error) => return self.fail(id, &error),
        };
        if cancel.is_cancelled() {
            return;
        }
        self.advance(id, QueueItemStatus::Loading, |item| {
            item.dialogue = Some(dialogue.clone());
            item.load_progress = Some(format!("0/{}", dialogue.len()));
        });

        let progress = |loaded: usize, total: usize| {
            if let Some(item) = self.lock().find_mut(id) {
                item.load_progress = Some(format!("{loaded}/{total}"));
            }
            self.publish();
        };
        match self.speech.synthesize_all(&dialogue, cancel, progress).await {
            Ok(audio) => self.ready(id, audio),
            Err(error) if error.is_cancelled() => {
                debug!(target: "anchordesk.queue", item_id = id, "Preparation canceled");
            }
            Err(error) => self.fail(id, &error),
        }
    }

    fn advance(&self, id: &str, next: QueueItemStatus, update: impl FnOnce(&mut QueueItem)) {
        let changed = {
            let mut inner = self.lock();
            match inner.find_mut(id) {
                Some(item) if item.status.can_advance_to(next) => {
                    item.status = next;
                    update(item);
                    true
                }
                Some(item) => {
                    warn!(target: "anchordesk.queue", item_id = id, from = ?item.status, to = ?next, "Ignored queue status change");
                    false
                }
                None => false,
            }
        };
        if changed {
            self.publish();
        }
    }

    fn ready(&self, id: &str, audio: AudioBundle) {
        info!(target: "anchordesk.queue", item_id = id, playable = audio.playable_count(), "Queued broadcast ready");
        self.advance(id, QueueItemStatus::Ready, |item| {
            item.audio = Some(audio);
            item.load_progress = None;
        });
    }

    fn fail(&self, id: &str, error: &StudioError) {
        warn!(target: "anchordesk.queue", item_id = id, %error, "Queued broadcast failed");
        self.advance(id, QueueItemStatus::Error, |item| {
            item.error = Some(error.user_message());
            item.load_progress = None;
        });
    }

    fn release_slot(self: &Arc<Self>, id: &str) {
        {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.cancels.remove(id);
        }
        self.drain_preparation();
    }

    /// Remove an item, canceling its preparation. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut inner = self.lock();
            let before = inner.items.len();
            inner.items.retain(|item| item.id != id);
            if let Some(cancel) = inner.cancels.get(id) {
                cancel.cancel();
            }
            inner.resequence();
            inner.items.len() != before
        };
        if removed {
            debug!(target: "anchordesk.queue", item_id = id, "Removed from queue");
            self.publish();
        }
        removed
    }

    /// The head item, if it is ready to play.
    pub fn peek_ready(&self) -> Option<QueueItem> {
        self.lock().items.first().filter(|item| item.is_ready()).cloned()
    }

    /// Pop the head item if it is ready to play.
    pub fn take_ready(&self) -> Option<QueueItem> {
        let item = {
            let mut inner = self.lock();
            if !inner.items.first().is_some_and(QueueItem::is_ready) {
                return None;
            }
            let item = inner.items.remove(0);
            inner.resequence();
            item
        };
        self.publish();
        Some(item)
    }

    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.lock().items.clone()
    }

    pub fn status(&self) -> QueueStatus {
        let inner = self.lock();
        QueueStatus::from_items(&inner.items, inner.in_flight)
    }
}

/// Frees a preparation slot when the preparation ends, however it ends.
struct PrepSlot {
    manager: Arc<QueueManager>,
    item_id: String,
}

impl Drop for PrepSlot {
    fn drop(&mut self) {
        self.manager.release_slot(&self.item_id);
    }
}
