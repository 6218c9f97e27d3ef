use crate::config::LineConfig;
use crate::line::types::{LineMessage, ReplyRequest};
use crate::reply::types::OutboundMessage;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Sends the single reply for an inbound event.
#[async_trait]
pub trait Replier: Send + Sync {
    async fn reply(&self, reply_token: &str, message: &OutboundMessage) -> Result<()>;
}

pub struct LineReplyClient {
    client: Client,
    endpoint: String,
    access_token: String,
}
impl LineReplyClient {
    pub fn new(config: &LineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build LINE Reqwest client!")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v2/bot/message/reply",
                config.api_base_url.trim_end_matches('/')
            ),
            access_token: config.channel_access_token.clone(),
        })
    }
}

#[async_trait]
impl Replier for LineReplyClient {
    async fn reply(&self, reply_token: &str, message: &OutboundMessage) -> Result<()> {
        let request_body = ReplyRequest {
            reply_token,
            messages: vec![LineMessage::from(message)],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&request_body)
            .send()
            .await
            .with_context(|| "Network error")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("LINE reply API returned {status}: {error_text}");
        }

        debug!("Sent {} reply", message.kind());
        Ok(())
    }
}
