//! Remote broadcast coordinator transport.

use async_trait::async_trait;

use crate::contracts::coordinator::{
    EndNotice, LiveNotice, NotifyResponse, StartRequest, StartResponse,
};
use crate::error::PortError;

/// Transport to the coordinator.
///
/// Implementations report transport failures and non-success statuses as
/// errors; deciding whether a start response is an acknowledgement is the
/// handshake client's job.
#[async_trait]
pub trait CoordinatorTransport: Send + Sync {
    async fn start(&self, request: &StartRequest) -> Result<StartResponse, PortError>;

    async fn live(&self, notice: &LiveNotice) -> Result<NotifyResponse, PortError>;

    async fn end(&self, notice: &EndNotice) -> Result<NotifyResponse, PortError>;

    /// Capability probe.
    async fn status(&self) -> Result<serde_json::Value, PortError>;

    /// Short label for logs (`"http"`, `"mock"`).
    fn label(&self) -> &'static str;
}
