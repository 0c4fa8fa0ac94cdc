//! Broadcast coordinator routes and payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Visibility;

/// Session negotiation endpoint.
pub const START_PATH: &str = "/api/v1/broadcast/start";

/// "Now live" beacon.
pub const LIVE_PATH: &str = "/api/v1/broadcast/live";

/// End-of-broadcast beacon with stats.
pub const END_PATH: &str = "/api/v1/broadcast/end";

/// Capability probe.
pub const STATUS_PATH: &str = "/api/v1/broadcast/status";

/// Status value the coordinator uses to acknowledge a start request.
pub const ACK_STATUS: &str = "ack";

/// Describes the client sending a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client: String,
    pub version: String,
    pub platform: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            client: "anchordesk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

/// `POST /api/v1/broadcast/start` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub broadcast_id: String,
    pub topic: String,
    pub visibility: Visibility,
    pub timestamp: DateTime<Utc>,
    pub client_info: ClientInfo,
    /// One-based attempt counter.
    pub attempt: u32,
    /// Set when the broadcast was pre-generated by the queue.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub queued: bool,
}

/// `POST /api/v1/broadcast/start` response.
///
/// Only `status == "ack"` counts as success; the remaining fields are
/// informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub status: String,
    #[serde(default)]
    pub broadcast_id: Option<String>,
    #[serde(default)]
    pub server_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

impl StartResponse {
    pub fn is_ack(&self) -> bool {
        self.status == ACK_STATUS
    }
}

/// `POST /api/v1/broadcast/live` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveNotice {
    pub broadcast_id: String,
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub lines_count: usize,
}

/// Outcome figures reported when a broadcast ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndStats {
    pub successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_played: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Orchestrator phase where the failure happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub canceled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_by: Option<String>,
    /// Filled in by the handshake client from its own session clock.
    #[serde(default)]
    pub duration_ms: u64,
}

impl EndStats {
    pub fn success() -> Self {
        Self {
            successful: true,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>, phase: impl Into<String>) -> Self {
        Self {
            successful: false,
            error: Some(error.into()),
            phase: Some(phase.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub const fn with_lines_played(mut self, lines: usize) -> Self {
        self.lines_played = Some(lines);
        self
    }

    #[must_use]
    pub const fn canceled(mut self) -> Self {
        self.canceled = true;
        self
    }

    #[must_use]
    pub fn ended_by(mut self, who: impl Into<String>) -> Self {
        self.ended_by = Some(who.into());
        self
    }
}

/// `POST /api/v1/broadcast/end` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndNotice {
    pub broadcast_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub stats: EndStats,
}

/// Generic acknowledgement for the live/end beacons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NotifyResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
