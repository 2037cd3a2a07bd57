//! Fanout dispatcher: one spawned send per destination, each with its own
//! timeout, none awaited by the tick driver.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;

use chatlink_core::format;
use chatlink_core::sanitize::escape_markdown;
use chatlink_core::topology::DisplaySettings;
use chatlink_core::types::ConsoleKind;
use chatlink_panel::PanelApi;
use chatlink_sink::{ChatSink, MessageStyle};

use crate::registry::Endpoint;

/// Avatar service used to impersonate Minecraft players on the sink.
const AVATAR_URL_BASE: &str = "https://mc-heads.net/avatar";

/// Avatar for a rich sink post, where the source console has one to offer.
#[must_use]
pub fn avatar_for(kind: ConsoleKind, sender: &str) -> Option<String> {
    match kind {
        ConsoleKind::Minecraft => Some(format!("{AVATAR_URL_BASE}/{sender}")),
        ConsoleKind::Generic => None,
    }
}

/// Fan one accepted chat message out to every other endpoint in the group,
/// and to the group's sink channel if it has one. Fire-and-forget: every
/// send is its own tracked task.
#[allow(clippy::too_many_arguments)]
pub fn fanout_chat(
    tasks: &TaskTracker,
    panel: &Arc<dyn PanelApi>,
    sink: Option<&Arc<dyn ChatSink>>,
    sink_channel: Option<&str>,
    members: &[Endpoint],
    source: &Endpoint,
    display: &DisplaySettings,
    sender: &str,
    content: &str,
    send_timeout: Duration,
) {
    for target in members {
        if target.name == source.name {
            continue;
        }
        let command =
            format::chat_command(target.kind, &display.alias, &display.color, sender, content);
        tasks.spawn(send_with_timeout(
            Arc::clone(panel),
            target.name.clone(),
            command,
            send_timeout,
        ));
    }

    if let (Some(sink), Some(channel)) = (sink, sink_channel) {
        let style = MessageStyle {
            source_alias: display.alias.clone(),
            avatar_url: avatar_for(source.kind, sender),
        };
        tasks.spawn(forward_to_sink(
            Arc::clone(sink),
            channel.to_owned(),
            sender.to_owned(),
            content.to_owned(),
            style,
        ));
    }
}

/// Send one console command, logging instead of propagating failure. A
/// slow destination burns its own timeout, not the tick's.
pub async fn send_with_timeout(
    panel: Arc<dyn PanelApi>,
    instance: String,
    command: String,
    send_timeout: Duration,
) {
    match tokio::time::timeout(send_timeout, panel.send_console(&instance, &command)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!("failed to send command to {instance}: {err}"),
        Err(_) => tracing::debug!("timeout sending command to {instance}"),
    }
}

/// Forward one message to the chat-UI sink: rich post under the author's
/// identity, falling back to a plain prefixed post.
pub async fn forward_to_sink(
    sink: Arc<dyn ChatSink>,
    channel: String,
    author: String,
    content: String,
    style: MessageStyle,
) {
    let text = escape_markdown(&content);
    if let Err(err) = sink.post(&channel, &author, &text, &style).await {
        tracing::debug!("rich post to {channel} failed, falling back to plain: {err}");
        let plain = format!(
            "**[{}]** <{}> {text}",
            escape_markdown(&style.source_alias),
            escape_markdown(&author)
        );
        if let Err(err) = sink.post_plain(&channel, &plain).await {
            tracing::warn!("failed to forward message to sink channel {channel}: {err}");
        }
    }
}
