//! Pre-generated broadcast backlog items.
//!
//! These types are "UI safe" snapshots: the queue manager owns the live
//! state and hands out clones.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::audio::AudioBundle;
use super::dialogue::DialogueLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    /// Waiting for a preparation slot.
    Preparing,
    Generating,
    /// Synthesizing speech.
    Loading,
    Ready,
    Error,
}

impl QueueItemStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Status advances strictly forward; any non-terminal status may fail.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Preparing, Self::Generating)
                | (Self::Generating, Self::Loading)
                | (Self::Loading, Self::Ready)
                | (Self::Preparing | Self::Generating | Self::Loading, Self::Error)
        )
    }
}

/// A queued broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<Vec<DialogueLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioBundle>,
    pub status: QueueItemStatus,
    /// Zero-based, contiguous across the queue.
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// `"loaded/total"` while synthesizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_progress: Option<String>,
}

impl QueueItem {
    pub fn new(topic: impl Into<String>, position: usize) -> Self {
        Self {
            id: format!("queue-{}", Uuid::new_v4().simple()),
            topic: topic.into(),
            dialogue: None,
            audio: None,
            status: QueueItemStatus::Preparing,
            position,
            error: None,
            load_progress: None,
        }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self.status, QueueItemStatus::Ready)
    }
}

/// Per-status counts for the whole queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub total: usize,
    pub preparing: usize,
    pub generating: usize,
    pub loading: usize,
    pub ready: usize,
    pub error: usize,
    /// Preparations currently holding a slot.
    pub in_flight: usize,
}

impl QueueStatus {
    pub fn from_items(items: &[QueueItem], in_flight: usize) -> Self {
        let mut status = Self {
            total: items.len(),
            in_flight,
            ..Self::default()
        };
        for item in items {
            match item.status {
                QueueItemStatus::Preparing => status.preparing += 1,
                QueueItemStatus::Generating => status.generating += 1,
                QueueItemStatus::Loading => status.loading += 1,
                QueueItemStatus::Ready => status.ready += 1,
                QueueItemStatus::Error => status.error += 1,
            }
        }
        status
    }
}
