//! HTTP coordinator transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use anchordesk_core::contracts::coordinator::{
    END_PATH, EndNotice, LIVE_PATH, LiveNotice, NotifyResponse, START_PATH, STATUS_PATH,
    StartRequest, StartResponse,
};
use anchordesk_core::{CoordinatorTransport, PortError};

pub struct HttpCoordinator {
    client: Client,
    base_url: String,
}

impl HttpCoordinator {
    /// `request_timeout` bounds every call, including the status probe.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PortError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, PortError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(target: "anchordesk.handshake", %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        read_json(response).await
    }
}

async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, PortError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(PortError::Status {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json()
        .await
        .map_err(|e| PortError::InvalidPayload(e.to_string()))
}

#[async_trait]
impl CoordinatorTransport for HttpCoordinator {
    async fn start(&self, request: &StartRequest) -> Result<StartResponse, PortError> {
        self.post(START_PATH, request).await
    }

    async fn live(&self, notice: &LiveNotice) -> Result<NotifyResponse, PortError> {
        self.post(LIVE_PATH, notice).await
    }

    async fn end(&self, notice: &EndNotice) -> Result<NotifyResponse, PortError> {
        self.post(END_PATH, notice).await
    }

    async fn status(&self) -> Result<serde_json::Value, PortError> {
        let response = self
            .client
            .get(self.url(STATUS_PATH))
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        read_json(response).await
    }

    fn label(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let http = HttpCoordinator::new("http://coord.local:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(http.base_url(), "http://coord.local:8080");
        assert_eq!(
            http.url(START_PATH),
            "http://coord.local:8080/api/v1/broadcast/start"
        );
    }
}
