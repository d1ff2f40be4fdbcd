//! HTTP webhook gateway.
//!
//! POSTs the abstract message model as JSON to a configured endpoint. The
//! endpoint owns the translation into the chat vendor's payload shape and
//! answers with `{"message_ref": "..."}` for posts.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{NotifyError, NotifyResult};
use crate::gateway::NotificationGateway;
use crate::message::{MessageRef, OutboundMessage, UpdatedMessage};

#[derive(Debug, Deserialize)]
struct PostResponse {
    message_ref: String,
}

/// Gateway that forwards messages to an HTTP adapter endpoint.
pub struct WebhookGateway {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl WebhookGateway {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("buildwarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            endpoint: endpoint.into(),
            token,
            client,
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), path);
        let mut req = self.client.post(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl NotificationGateway for WebhookGateway {
    async fn post(&self, message: OutboundMessage) -> NotifyResult<MessageRef> {
        debug!(channel = %message.channel, "Posting notification");
        let response = self.request("messages").json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PostResponse = response.json().await?;
        Ok(MessageRef(parsed.message_ref))
    }

    async fn update(&self, message: UpdatedMessage) -> NotifyResult<()> {
        debug!(
            channel = %message.channel,
            message_ref = %message.message_ref,
            "Updating notification"
        );
        let response = self
            .request("messages/update")
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
