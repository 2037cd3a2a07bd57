//! In-band command handlers.
//!
//! Each handler runs as its own task off the broadcast path. Handlers that
//! need a delayed console response register with the pending registry and
//! degrade to a no-op when nothing answers in time.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio_util::task::TaskTracker;

use chatlink_core::command::BridgeCommand;
use chatlink_core::format;
use chatlink_core::sanitize::{escape_markdown, sanitize_for_console};
use chatlink_core::types::ConsoleKind;
use chatlink_panel::PanelApi;
use chatlink_sink::{ChatSink, MessageStyle};

use crate::dispatch;
use crate::engine::GroupContext;
use crate::pending::PendingRegistry;
use crate::presence;
use crate::registry::Endpoint;

/// How long `!item` waits for the console to echo the probed data; covers
/// at least two polling ticks.
pub const ITEM_RESPONSE_WAIT: Duration = Duration::from_secs(4);

/// Everything a handler needs, snapshotted at interception time so the
/// tick driver's state is never touched from a handler task.
#[derive(Clone)]
pub struct CommandCtx {
    pub panel: Arc<dyn PanelApi>,
    pub sink: Option<Arc<dyn ChatSink>>,
    pub pending: Arc<PendingRegistry>,
    pub tasks: TaskTracker,
    pub source: Endpoint,
    pub sender: String,
    pub group: GroupContext,
    pub send_timeout: Duration,
}

pub async fn handle(command: BridgeCommand, ctx: CommandCtx) {
    match command {
        BridgeCommand::Online => online(ctx).await,
        BridgeCommand::Help => help(ctx).await,
        BridgeCommand::Item => item(ctx).await,
    }
}

/// `!online` — list players across the group, addressed back at the asker.
async fn online(ctx: CommandCtx) {
    let roster = presence::online_players(
        Arc::clone(&ctx.panel),
        ctx.group.roster_queries(),
        ctx.send_timeout,
    )
    .await;
    let command = format::online_reply(ctx.source.kind, &ctx.sender, &roster);
    dispatch::send_with_timeout(ctx.panel, ctx.source.name, command, ctx.send_timeout).await;
}

/// `!help` — static command list.
async fn help(ctx: CommandCtx) {
    let command = format::help_reply(ctx.source.kind, &ctx.sender);
    dispatch::send_with_timeout(ctx.panel, ctx.source.name, command, ctx.send_timeout).await;
}

/// `!item` — probe the console for the sender's held item, wait for the
/// echoed data line, then broadcast it to the whole group (source
/// included) and the sink.
async fn item(ctx: CommandCtx) {
    // `data get` only exists on Minecraft consoles.
    if ctx.source.kind != ConsoleKind::Minecraft {
        return;
    }

    let probe = format!(
        "data get entity {} SelectedItem.id",
        sanitize_for_console(&ctx.sender)
    );
    dispatch::send_with_timeout(
        Arc::clone(&ctx.panel),
        ctx.source.name.clone(),
        probe,
        ctx.send_timeout,
    )
    .await;

    // Response shape: `Alice has the following entity data: "gtceu:tritanium_coil_block"`
    // — the namespace prefix is optional and discarded.
    let pattern = match Regex::new(&format!(
        r#"{} has the following entity data: "(?:[^:]+:)?(.+?)""#,
        regex::escape(&ctx.sender)
    )) {
        Ok(pattern) => pattern,
        Err(err) => {
            tracing::debug!("unusable item pattern for {}: {err}", ctx.sender);
            return;
        }
    };
    let rx = ctx.pending.register(&ctx.source.name, pattern);

    let Ok(Ok(item_id)) = tokio::time::timeout(ITEM_RESPONSE_WAIT, rx).await else {
        tracing::debug!(
            "no held-item response from {} for {}",
            ctx.source.name,
            ctx.sender
        );
        return;
    };
    let item_name = format::prettify_item(&item_id);
    let display = ctx.group.display_for(&ctx.source.name);

    for target in &ctx.group.members {
        let command = format::item_broadcast(
            target.kind,
            &display.alias,
            &display.color,
            &ctx.sender,
            &item_name,
        );
        ctx.tasks.spawn(dispatch::send_with_timeout(
            Arc::clone(&ctx.panel),
            target.name.clone(),
            command,
            ctx.send_timeout,
        ));
    }

    if let (Some(sink), Some(channel)) = (&ctx.sink, &ctx.group.sink_channel) {
        let sink = Arc::clone(sink);
        let channel = channel.clone();
        let author = ctx.sender.clone();
        let style = MessageStyle {
            source_alias: display.alias.clone(),
            avatar_url: dispatch::avatar_for(ctx.source.kind, &ctx.sender),
        };
        let text = format!("shared an item: **{}**", escape_markdown(&item_name));
        ctx.tasks.spawn(async move {
            if let Err(err) = sink.post(&channel, &author, &text, &style).await {
                tracing::debug!("item share post to {channel} failed, falling back: {err}");
                let plain = format!("**[{}]** <{author}> {text}", style.source_alias);
                if let Err(err) = sink.post_plain(&channel, &plain).await {
                    tracing::warn!("failed to post item share to {channel}: {err}");
                }
            }
        });
    }
}
