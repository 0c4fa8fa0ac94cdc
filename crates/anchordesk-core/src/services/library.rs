//! Broadcast library: access control and content policy over the record store.
//!
//! The store holds raw records; this service decides who sees what. A record
//! is visible to its owner and, when public, to everyone. Only the owner may
//! change visibility or delete. Content is sanitized on the way in and again
//! on the way out, so records written by older clients are still safe to
//! render.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{Broadcast, DialogueLine, FeedFilter, NewBroadcast, Visibility};
use crate::error::{PortError, StudioError, StudioResult};
use crate::ports::RecordStorePort;
use crate::sanitize::{contains_blocked_media_urls, sanitize_broadcast, sanitize_dialogue, sanitize_topic};

const BLOCKED_TOPIC_MESSAGE: &str =
    "Your topic contains URLs to media hosting sites which are not allowed.";

/// Service over the `news_broadcast` collection.
#[derive(Clone)]
pub struct BroadcastLibrary {
    store: Arc<dyn RecordStorePort>,
}

impl BroadcastLibrary {
    pub fn new(store: Arc<dyn RecordStorePort>) -> Self {
        Self { store }
    }

    /// Sanitize and persist a new broadcast owned by `owner`.
    pub async fn save(
        &self,
        owner: &str,
        topic: &str,
        dialogue: &[DialogueLine],
        visibility: Visibility,
    ) -> StudioResult<Broadcast> {
        if contains_blocked_media_urls(topic) {
            return Err(StudioError::content_policy(BLOCKED_TOPIC_MESSAGE));
        }

        let record = NewBroadcast {
            topic: sanitize_topic(topic),
            dialogue: sanitize_dialogue(dialogue),
            visibility,
            timestamp: Utc::now(),
            owner: owner.to_string(),
        };
        let saved = self
            .store
            .create(record)
            .await
            .map_err(|e| StudioError::store(&e))?;

        info!(target: "anchordesk.library", broadcast_id = %saved.id, %visibility, "Broadcast saved");
        Ok(saved)
    }

    /// Broadcasts visible to `requester`, newest first, sanitized.
    pub async fn list(
        &self,
        requester: Option<&str>,
        filter: FeedFilter,
    ) -> StudioResult<Vec<Broadcast>> {
        let all = self.store.list().await.map_err(|e| StudioError::store(&e))?;
        Ok(visible_feed(all, requester, filter))
    }

    /// A single broadcast, if `requester` may see it.
    ///
    /// Invisible records are reported as not found.
    pub async fn get(&self, id: &str, requester: Option<&str>) -> StudioResult<Broadcast> {
        let record = self
            .store
            .get(id)
            .await
            .map_err(|e| StudioError::store(&e))?
            .filter(|b| b.is_visible_to(requester))
            .ok_or_else(|| StudioError::not_found("Broadcast not found"))?;
        Ok(sanitize_broadcast(&record))
    }

    pub async fn set_visibility(
        &self,
        id: &str,
        visibility: Visibility,
        requester: &str,
    ) -> StudioResult<()> {
        self.owned(id, requester, "modify").await?;
        self.store
            .update_visibility(id, visibility)
            .await
            .map_err(|e| map_missing(&e))?;
        info!(target: "anchordesk.library", broadcast_id = %id, %visibility, "Visibility updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str, requester: &str) -> StudioResult<()> {
        self.owned(id, requester, "delete").await?;
        self.store.delete(id).await.map_err(|e| map_missing(&e))?;
        info!(target: "anchordesk.library", broadcast_id = %id, "Broadcast deleted");
        Ok(())
    }

    /// Live feed for `requester`, filtered like [`list`](Self::list).
    pub fn subscribe(&self, requester: Option<String>, filter: FeedFilter) -> FeedSubscription {
        FeedSubscription {
            rx: self.store.subscribe(),
            requester,
            filter,
        }
    }

    async fn owned(&self, id: &str, requester: &str, action: &str) -> StudioResult<Broadcast> {
        let record = self
            .store
            .get(id)
            .await
            .map_err(|e| StudioError::store(&e))?
            .ok_or_else(|| StudioError::not_found("Broadcast not found"))?;

        if !record.is_owned_by(Some(requester)) {
            warn!(
                target: "anchordesk.library",
                broadcast_id = %id,
                requester,
                action,
                "Rejected mutation by non-owner"
            );
            return Err(StudioError::permission(format!(
                "You do not have permission to {action} this broadcast"
            )));
        }
        Ok(record)
    }
}

fn map_missing(err: &PortError) -> StudioError {
    match err {
        PortError::NotFound(_) => StudioError::not_found("Broadcast not found"),
        other => StudioError::store(other),
    }
}

fn visible_feed(
    all: Vec<Broadcast>,
    requester: Option<&str>,
    filter: FeedFilter,
) -> Vec<Broadcast> {
    let mut visible: Vec<Broadcast> = all
        .into_iter()
        .filter(|b| filter.matches(b, requester))
        .map(|b| sanitize_broadcast(&b))
        .collect();
    visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    visible
}

/// Stream of feed snapshots for one requester.
pub struct FeedSubscription {
    rx: broadcast::Receiver<Vec<Broadcast>>,
    requester: Option<String>,
    filter: FeedFilter,
}

impl FeedSubscription {
    /// Next visible snapshot, or `None` once the store is gone.
    ///
    /// Lagging receivers skip to the newest snapshot; every snapshot is
    /// complete, so nothing is lost.
    pub async fn next(&mut self) -> Option<Vec<Broadcast>> {
        loop {
            match self.rx.recv().await {
                Ok(all) => {
                    return Some(visible_feed(all, self.requester.as_deref(), self.filter));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(target: "anchordesk.library", skipped, "Feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
