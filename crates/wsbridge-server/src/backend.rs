//! Backend client: forwards client frames to the configured backend URL.
//!
//! Shared by all sessions and stateless beyond its destination URL. The
//! session's reply address rides along as a request header so the backend can
//! POST asynchronous replies back through the gateway.

use axum::body::Bytes;
use std::time::Duration;
use wsbridge_core::{BridgeError, BridgeResult, REPLY_CHANNEL_HEADER};

/// HTTP client for the fixed backend destination.
pub struct BackendClient {
    /// Destination URL, immutable after construction.
    url: String,
    /// HTTP client (reusable).
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST one opaque payload to the backend with the reply address attached.
    ///
    /// A transport error or non-success status is returned to the caller; it
    /// is the caller's policy whether that matters (the relay loop logs it
    /// and keeps the session alive).
    pub async fn forward(&self, payload: Bytes, reply_channel: &str) -> BridgeResult<()> {
        let response = self
            .http
            .post(&self.url)
            .header(REPLY_CHANNEL_HEADER, reply_channel)
            .body(payload)
            .send()
            .await
            .map_err(|e| BridgeError::ForwardFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::ForwardFailed(format!(
                "backend returned {status}"
            )));
        }
        Ok(())
    }
}
