//! In-process coordinator used when no real one is reachable.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use anchordesk_core::contracts::coordinator::{
    ACK_STATUS, EndNotice, LiveNotice, NotifyResponse, StartRequest, StartResponse,
};
use anchordesk_core::{CoordinatorTransport, PortError};

/// Acknowledges every start request locally.
#[derive(Debug, Default)]
pub struct MockCoordinator {
    starts: AtomicU64,
}

impl MockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start requests acknowledged so far.
    pub fn starts(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CoordinatorTransport for MockCoordinator {
    async fn start(&self, request: &StartRequest) -> Result<StartResponse, PortError> {
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(StartResponse {
            status: ACK_STATUS.to_string(),
            broadcast_id: Some(request.broadcast_id.clone()),
            server_timestamp: Some(Utc::now()),
            message: Some("Broadcast request acknowledged (mock)".to_string()),
            success: Some(true),
        })
    }

    async fn live(&self, _notice: &LiveNotice) -> Result<NotifyResponse, PortError> {
        Ok(NotifyResponse::new("acknowledged"))
    }

    async fn end(&self, _notice: &EndNotice) -> Result<NotifyResponse, PortError> {
        Ok(NotifyResponse::new("acknowledged"))
    }

    async fn status(&self) -> Result<serde_json::Value, PortError> {
        Ok(serde_json::json!({
            "status": "ok",
            "mode": "mock",
            "starts": self.starts(),
        }))
    }

    fn label(&self) -> &'static str {
        "mock"
    }
}
