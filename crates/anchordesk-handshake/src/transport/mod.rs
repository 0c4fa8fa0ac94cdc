//! Coordinator transports and the startup probe that picks one.

mod http;
mod mock;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use anchordesk_core::CoordinatorTransport;

pub use http::HttpCoordinator;
pub use mock::MockCoordinator;

/// Probe `base_url` and return an HTTP transport if it answers, otherwise
/// the local mock.
///
/// No URL at all also selects the mock.
pub async fn connect_coordinator(
    base_url: Option<&str>,
    request_timeout: Duration,
) -> Arc<dyn CoordinatorTransport> {
    let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) else {
        info!(target: "anchordesk.handshake", "No coordinator configured, using local mock");
        return Arc::new(MockCoordinator::new());
    };

    let http = match HttpCoordinator::new(base_url, request_timeout) {
        Ok(http) => http,
        Err(error) => {
            warn!(target: "anchordesk.handshake", %error, "Coordinator client unavailable, using local mock");
            return Arc::new(MockCoordinator::new());
        }
    };

    match http.status().await {
        Ok(_) => {
            info!(target: "anchordesk.handshake", base_url, "Connected to coordinator");
            Arc::new(http)
        }
        Err(error) => {
            warn!(target: "anchordesk.handshake", base_url, %error, "Coordinator probe failed, using local mock");
            Arc::new(MockCoordinator::new())
        }
    }
}
