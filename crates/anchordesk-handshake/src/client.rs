//! Handshake client: one negotiated session at a time.
//!
//! # Design
//!
//! - `negotiate` resets the session, then races each start request against
//!   the attempt timeout. Timeouts, transport errors, and non-`ack` answers
//!   are retried after a fixed delay, with the attempt number in the payload.
//! - `notify_live` and `notify_end` are beacons. They never fail: a lost
//!   beacon is logged and a fallback response is returned.
//! - `notify_end` always clears the session, whatever the transport says.
//!
//! Session and log each sit behind their own `std::sync::Mutex`; neither is
//! held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use anchordesk_core::contracts::coordinator::{
    ClientInfo, EndNotice, EndStats, LiveNotice, NotifyResponse, StartRequest, StartResponse,
};
use anchordesk_core::{CoordinatorTransport, HandshakeError, StudioSettings, Visibility};

use crate::log::{HandshakeLog, LogEntry, LogEvent};

/// Status returned by a beacon sent without an active session.
pub const NO_ACTIVE_BROADCAST: &str = "no_active_broadcast";

/// Status returned when a beacon could not be delivered.
pub const BEACON_FAILED: &str = "error";

#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
    pub client_info: ClientInfo,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::from_settings(&StudioSettings::with_defaults())
    }
}

impl HandshakeConfig {
    pub fn from_settings(settings: &StudioSettings) -> Self {
        Self {
            max_attempts: settings.handshake_attempts.max(1),
            attempt_timeout: Duration::from_millis(settings.handshake_timeout_ms),
            retry_delay: Duration::from_millis(settings.handshake_retry_delay_ms),
            client_info: ClientInfo::default(),
        }
    }
}

/// What to negotiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Use this id instead of generating one.
    pub broadcast_id: Option<String>,
    pub topic: String,
    pub visibility: Visibility,
    pub queued: bool,
}

impl HandshakeRequest {
    pub fn new(topic: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            broadcast_id: None,
            topic: topic.into(),
            visibility,
            queued: false,
        }
    }

    #[must_use]
    pub fn with_id(mut self, broadcast_id: impl Into<String>) -> Self {
        self.broadcast_id = Some(broadcast_id.into());
        self
    }

    #[must_use]
    pub const fn queued(mut self) -> Self {
        self.queued = true;
        self
    }
}

/// A successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeAck {
    pub broadcast_id: String,
    /// Attempts used, 1-based.
    pub attempts: u32,
    pub response: StartResponse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Negotiating,
    Acked,
    Failed,
}

/// Public view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub active_id: Option<String>,
    pub handshake_complete: bool,
    pub retry_count: u32,
    pub state: SessionState,
}

#[derive(Debug, Default)]
struct Session {
    snapshot: SessionSnapshot,
    started_at: Option<Instant>,
}

/// `bc_<unix millis>_<9 random hex chars>`.
pub fn generate_broadcast_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("bc_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}

pub struct HandshakeClient {
    transport: Arc<dyn CoordinatorTransport>,
    config: HandshakeConfig,
    session: Mutex<Session>,
    log: Mutex<HandshakeLog>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HandshakeClient {
    pub fn new(transport: Arc<dyn CoordinatorTransport>, config: HandshakeConfig) -> Self {
        Self {
            transport,
            config,
            session: Mutex::new(Session::default()),
            log: Mutex::new(HandshakeLog::default()),
        }
    }

    pub fn transport_label(&self) -> &'static str {
        self.transport.label()
    }

    fn record(&self, event: LogEvent, broadcast_id: Option<&str>, details: serde_json::Value) {
        lock(&self.log).push(event, broadcast_id, details);
    }

    /// Negotiate a session, retrying up to the configured attempt count.
    pub async fn negotiate(&self, request: HandshakeRequest) -> Result<HandshakeAck, HandshakeError> {
        let broadcast_id = request
            .broadcast_id
            .clone()
            .unwrap_or_else(generate_broadcast_id);
        let max_attempts = self.config.max_attempts.max(1);

        *lock(&self.session) = Session {
            snapshot: SessionSnapshot {
                active_id: Some(broadcast_id.clone()),
                handshake_complete: false,
                retry_count: 0,
                state: SessionState::Negotiating,
            },
            started_at: Some(Instant::now()),
        };
        self.record(
            LogEvent::Start,
            Some(&broadcast_id),
            json!({
                "topic": request.topic,
                "visibility": request.visibility,
                "queued": request.queued,
                "transport": self.transport.label(),
            }),
        );
        debug!(target: "anchordesk.handshake", %broadcast_id, queued = request.queued, "Negotiating broadcast");

        let mut last_error = None;
        for attempt in 1..=max_attempts {
            let payload = StartRequest {
                broadcast_id: broadcast_id.clone(),
                topic: request.topic.clone(),
                visibility: request.visibility,
                timestamp: Utc::now(),
                client_info: self.config.client_info.clone(),
                attempt,
                queued: request.queued,
            };

            match self.attempt(&payload).await {
                Ok(response) => {
                    {
                        let mut session = lock(&self.session);
                        session.snapshot.handshake_complete = true;
                        session.snapshot.state = SessionState::Acked;
                    }
                    self.record(
                        LogEvent::Ack,
                        Some(&broadcast_id),
                        json!({ "attempt": attempt, "response": response }),
                    );
                    info!(target: "anchordesk.handshake", %broadcast_id, attempt, "Handshake acknowledged");
                    return Ok(HandshakeAck {
                        broadcast_id,
                        attempts: attempt,
                        response,
                    });
                }
                Err(err) => {
                    warn!(target: "anchordesk.handshake", %broadcast_id, attempt, error = %err, "Handshake attempt failed");
                    if attempt < max_attempts {
                        lock(&self.session).snapshot.retry_count = attempt;
                        self.record(
                            LogEvent::Retry,
                            Some(&broadcast_id),
                            json!({ "attempt": attempt, "error": err.to_string() }),
                        );
                        sleep(self.config.retry_delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let error = HandshakeError::Exhausted {
            attempts: max_attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        };
        lock(&self.session).snapshot.state = SessionState::Failed;
        self.record(
            LogEvent::Error,
            Some(&broadcast_id),
            json!({ "error": error.to_string() }),
        );
        error!(target: "anchordesk.handshake", %broadcast_id, %error, "Handshake failed");
        Err(error)
    }

    async fn attempt(&self, payload: &StartRequest) -> Result<StartResponse, HandshakeError> {
        match timeout(self.config.attempt_timeout, self.transport.start(payload)).await {
            Err(_) => Err(HandshakeError::Timeout {
                attempt: payload.attempt,
                timeout_ms: u64::try_from(self.config.attempt_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            }),
            Ok(Err(err)) => Err(HandshakeError::transport(err.to_string())),
            Ok(Ok(response)) if response.is_ack() => Ok(response),
            Ok(Ok(response)) => Err(HandshakeError::invalid_response(format!(
                "expected status 'ack', got '{}'",
                response.status
            ))),
        }
    }

    /// Tell the coordinator the active broadcast is on air. Never fails.
    pub async fn notify_live(&self, topic: &str, lines_count: usize) -> NotifyResponse {
        let Some(broadcast_id) = self.active_broadcast_id() else {
            self.record(
                LogEvent::Error,
                None,
                json!({ "error": "live notification without an active broadcast" }),
            );
            warn!(target: "anchordesk.handshake", "Live notification without an active broadcast");
            return NotifyResponse::new(NO_ACTIVE_BROADCAST);
        };

        let notice = LiveNotice {
            broadcast_id: broadcast_id.clone(),
            topic: topic.to_string(),
            timestamp: Utc::now(),
            status: "live".to_string(),
            lines_count,
        };
        match timeout(self.config.attempt_timeout, self.transport.live(&notice)).await {
            Ok(Ok(response)) => {
                self.record(LogEvent::Live, Some(&broadcast_id), json!({ "lines_count": lines_count }));
                debug!(target: "anchordesk.handshake", %broadcast_id, "Live notification sent");
                response
            }
            Ok(Err(err)) => self.beacon_failed("live", &broadcast_id, &err.to_string()),
            Err(_) => self.beacon_failed("live", &broadcast_id, "timed out"),
        }
    }

    /// Report the outcome of the active broadcast and clear the session.
    /// Never fails.
    pub async fn notify_end(&self, mut stats: EndStats) -> NotifyResponse {
        let session = std::mem::take(&mut *lock(&self.session));
        let Some(broadcast_id) = session.snapshot.active_id else {
            debug!(target: "anchordesk.handshake", "End notification without an active broadcast");
            return NotifyResponse::new(NO_ACTIVE_BROADCAST);
        };
        stats.duration_ms = session.started_at.map_or(0, |started| {
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
        });

        let details = json!({ "stats": stats });
        let notice = EndNotice {
            broadcast_id: broadcast_id.clone(),
            timestamp: Utc::now(),
            status: if stats.successful { "completed" } else { "failed" }.to_string(),
            stats,
        };
        match timeout(self.config.attempt_timeout, self.transport.end(&notice)).await {
            Ok(Ok(response)) => {
                self.record(LogEvent::End, Some(&broadcast_id), details);
                info!(
                    target: "anchordesk.handshake",
                    %broadcast_id,
                    successful = notice.stats.successful,
                    duration_ms = notice.stats.duration_ms,
                    "Broadcast ended"
                );
                response
            }
            Ok(Err(err)) => self.beacon_failed("end", &broadcast_id, &err.to_string()),
            Err(_) => self.beacon_failed("end", &broadcast_id, "timed out"),
        }
    }

    fn beacon_failed(&self, beacon: &str, broadcast_id: &str, error: &str) -> NotifyResponse {
        self.record(
            LogEvent::Error,
            Some(broadcast_id),
            json!({ "beacon": beacon, "error": error }),
        );
        warn!(target: "anchordesk.handshake", %broadcast_id, beacon, error, "Beacon not delivered");
        NotifyResponse::new(BEACON_FAILED).with_message(error)
    }

    pub fn session(&self) -> SessionSnapshot {
        lock(&self.session).snapshot.clone()
    }

    pub fn active_broadcast_id(&self) -> Option<String> {
        lock(&self.session).snapshot.active_id.clone()
    }

    pub fn is_handshake_complete(&self) -> bool {
        lock(&self.session).snapshot.handshake_complete
    }

    /// Oldest entry first.
    pub fn event_log(&self) -> Vec<LogEntry> {
        lock(&self.log).entries()
    }
}
