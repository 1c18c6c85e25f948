//! HTTP push transport against the Expo push gateway.

use crate::transport::PushTransport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tidypush_core::config::PushConfig;
use tidypush_core::types::{DeliveryTicket, NotificationMessage, Receipt};
use tidypush_core::{NotifyError, NotifyResult};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SendResponse {
    data: Vec<DeliveryTicket>,
}

#[derive(Debug, Serialize)]
struct ReceiptsRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ReceiptsResponse {
    data: HashMap<String, Receipt>,
}

/// Push transport backed by the Expo HTTP API.
pub struct ExpoTransport {
    client: reqwest::Client,
    send_url: String,
    receipts_url: String,
}

impl ExpoTransport {
    pub fn new(config: &PushConfig) -> NotifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| NotifyError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            send_url: config.send_url.clone(),
            receipts_url: config.receipts_url.clone(),
        })
    }
}

#[async_trait]
impl PushTransport for ExpoTransport {
    async fn send_batch(
        &self,
        messages: &[NotificationMessage],
    ) -> NotifyResult<Vec<DeliveryTicket>> {
        debug!(count = messages.len(), "submitting push batch");
        let response = self
            .client
            .post(&self.send_url)
            .json(messages)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(format!("push send request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Transport(format!(
                "push gateway returned {status}: {body}"
            )));
        }

        let body: SendResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Transport(format!("malformed ticket response: {e}")))?;
        Ok(body.data)
    }

    async fn get_receipts(&self, ids: &[String]) -> NotifyResult<HashMap<String, Receipt>> {
        debug!(count = ids.len(), "fetching delivery receipts");
        let response = self
            .client
            .post(&self.receipts_url)
            .json(&ReceiptsRequest { ids })
            .send()
            .await
            .map_err(|e| NotifyError::Transport(format!("receipt request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Transport(format!(
                "receipt endpoint returned {status}: {body}"
            )));
        }

        let body: ReceiptsResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Transport(format!("malformed receipt response: {e}")))?;
        Ok(body.data)
    }
}
