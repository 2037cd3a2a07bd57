//! External chat-UI sink boundary.
//!
//! A sink is a read-only chat surface (outside the polled consoles) that
//! receives a copy of bridged messages. The engine only sees [`ChatSink`];
//! [`WebhookSink`] is the production implementation.

pub mod webhook;

use async_trait::async_trait;
use thiserror::Error;

pub use webhook::WebhookSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink rejected request with status {0}")]
    Status(u16),
}

/// Presentation hints for a rich post.
#[derive(Debug, Clone, Default)]
pub struct MessageStyle {
    /// Display alias of the originating endpoint.
    pub source_alias: String,
    /// Avatar to impersonate the author with, when the sink supports it.
    pub avatar_url: Option<String>,
}

/// Operations the engine performs against the chat UI.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Rich post under the author's identity. Callers fall back to
    /// [`ChatSink::post_plain`] when this fails.
    async fn post(
        &self,
        channel: &str,
        author: &str,
        text: &str,
        style: &MessageStyle,
    ) -> Result<(), SinkError>;

    /// Unstyled fallback post.
    async fn post_plain(&self, channel: &str, text: &str) -> Result<(), SinkError>;

    /// Best-effort channel topic update.
    async fn set_topic(&self, channel: &str, topic: &str) -> Result<(), SinkError>;
}
