//! Bounded handshake event log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entries kept before the oldest is dropped.
pub const HANDSHAKE_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEvent {
    Start,
    Ack,
    Retry,
    Live,
    End,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub event: LogEvent,
    pub timestamp: DateTime<Utc>,
    pub broadcast_id: Option<String>,
    pub details: serde_json::Value,
}

/// Ring of the most recent [`HANDSHAKE_LOG_CAPACITY`] entries.
#[derive(Debug, Clone)]
pub struct HandshakeLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for HandshakeLog {
    fn default() -> Self {
        Self::with_capacity(HANDSHAKE_LOG_CAPACITY)
    }
}

impl HandshakeLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: LogEvent, broadcast_id: Option<&str>, details: serde_json::Value) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            event,
            timestamp: Utc::now(),
            broadcast_id: broadcast_id.map(str::to_string),
            details,
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
