//! Webhook-style sink client using raw reqwest (no framework).
//!
//! Posts to a chat-service REST API: rich posts impersonate the player
//! (username + avatar), the plain fallback prefixes the source alias
//! instead. Topic updates are a PATCH on the channel resource.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::{ChatSink, MessageStyle, SinkError};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WebhookSink {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
            client,
        })
    }

    fn channel_url(&self, channel: &str, resource: &str) -> String {
        format!("{}/channels/{channel}/{resource}", self.base_url)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<(), SinkError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(resp.status().as_u16()))
        }
    }
}

#[async_trait]
impl ChatSink for WebhookSink {
    async fn post(
        &self,
        channel: &str,
        author: &str,
        text: &str,
        style: &MessageStyle,
    ) -> Result<(), SinkError> {
        let resp = self
            .request(self.client.post(self.channel_url(channel, "messages")))
            .json(&json!({
                "username": format!("{author} [{}]", style.source_alias),
                "avatar_url": style.avatar_url,
                "content": text,
                "allowed_mentions": { "parse": [] },
            }))
            .send()
            .await?;
        Self::check(resp).await
    }

    async fn post_plain(&self, channel: &str, text: &str) -> Result<(), SinkError> {
        let resp = self
            .request(self.client.post(self.channel_url(channel, "messages")))
            .json(&json!({
                "content": text,
                "allowed_mentions": { "parse": [] },
            }))
            .send()
            .await?;
        Self::check(resp).await
    }

    async fn set_topic(&self, channel: &str, topic: &str) -> Result<(), SinkError> {
        let resp = self
            .request(self.client.patch(self.channel_url(channel, "topic")))
            .json(&json!({ "topic": topic }))
            .send()
            .await?;
        Self::check(resp).await
    }
}
