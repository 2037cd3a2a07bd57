//! Tick engine: wires panel → watermark → filter → interceptor → fanout.
//!
//! One fixed-interval driver owns all per-endpoint state (watermarks,
//! failure trackers, registry, topic marks). Polls run concurrently and
//! are awaited; outbound sends are spawned on a task tracker and never
//! block the next tick. The pending-command registry is the only structure
//! shared with handler tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use chatlink_core::command;
use chatlink_core::failure::{DEFAULT_FAILURE_THRESHOLD, FailureTracker, HealAction};
use chatlink_core::filter;
use chatlink_core::format::DEFAULT_COLOR;
use chatlink_core::topology::{DisplaySettings, Group};
use chatlink_core::types::LogEntry;
use chatlink_core::watermark::Watermark;
use chatlink_panel::PanelApi;
use chatlink_sink::ChatSink;

use crate::commands::{self, CommandCtx};
use crate::config::TopologyFile;
use crate::dispatch;
use crate::pending::PendingRegistry;
use crate::presence;
use crate::registry::{Endpoint, EndpointRegistry, REGISTRY_REFRESH_TICKS};

// ─── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub tick: Duration,
    pub poll_timeout: Duration,
    pub send_timeout: Duration,
    pub failure_threshold: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(5),
            send_timeout: Duration::from_secs(5),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

// ─── Group context ───────────────────────────────────────────────────

/// Snapshot of one group resolved against the registry, handed to
/// dispatchers and command handlers so they never read engine state.
#[derive(Clone)]
pub struct GroupContext {
    pub name: String,
    pub members: Vec<Endpoint>,
    pub displays: HashMap<String, DisplaySettings>,
    pub sink_channel: Option<String>,
}

impl GroupContext {
    /// Display settings for a member, defaulting for names the topology
    /// does not configure.
    #[must_use]
    pub fn display_for(&self, name: &str) -> DisplaySettings {
        self.displays.get(name).cloned().unwrap_or_else(|| DisplaySettings {
            alias: name.to_owned(),
            color: DEFAULT_COLOR.to_owned(),
        })
    }

    /// `(endpoint, alias)` pairs for roster lookups.
    #[must_use]
    pub fn roster_queries(&self) -> Vec<(Endpoint, String)> {
        self.members
            .iter()
            .map(|member| (member.clone(), self.display_for(&member.name).alias))
            .collect()
    }
}

// ─── Engine ──────────────────────────────────────────────────────────

pub struct Engine {
    panel: Arc<dyn PanelApi>,
    sink: Option<Arc<dyn ChatSink>>,
    topology: TopologyFile,
    registry: EndpointRegistry,
    watermarks: HashMap<String, Watermark>,
    failures: HashMap<String, FailureTracker>,
    pending: Arc<PendingRegistry>,
    /// Last topic refresh per group, surviving topology reloads.
    topic_marks: HashMap<String, DateTime<Utc>>,
    tasks: TaskTracker,
    opts: EngineOptions,
    ticks: u64,
}

impl Engine {
    #[must_use]
    pub fn new(
        panel: Arc<dyn PanelApi>,
        sink: Option<Arc<dyn ChatSink>>,
        topology: TopologyFile,
        opts: EngineOptions,
    ) -> Self {
        Self {
            panel,
            sink,
            topology,
            registry: EndpointRegistry::new(),
            watermarks: HashMap::new(),
            failures: HashMap::new(),
            pending: Arc::new(PendingRegistry::new()),
            topic_marks: HashMap::new(),
            tasks: TaskTracker::new(),
            opts,
            ticks: 0,
        }
    }

    /// Run ticks until cancelled, then give in-flight dispatches one send
    /// timeout to drain.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.opts.tick);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("shutdown requested, stopping tick loop");
                    break;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }

        self.tasks.close();
        let grace = self.opts.send_timeout + Duration::from_secs(1);
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            tracing::warn!("dispatch tasks still running after {grace:?}, abandoning them");
        }
    }

    /// One synchronization pass. Public so tests can drive the engine
    /// without the interval timer.
    pub async fn tick(&mut self) {
        self.topology.reload_if_changed();
        if self.ticks % REGISTRY_REFRESH_TICKS == 0 {
            self.registry.refresh(self.panel.as_ref()).await;
        }
        self.ticks += 1;

        let active: Vec<String> = self
            .topology
            .doc()
            .active_members()
            .into_iter()
            .map(str::to_owned)
            .collect();
        if active.is_empty() {
            return;
        }

        let fresh = self.poll_endpoints(&active).await;
        let candidates = self.classify_and_intercept(fresh);
        self.dispatch_tick(&candidates);
    }

    /// Watermark cutoff for an endpoint, if it has been polled.
    #[must_use]
    pub fn watermark_timestamp(&self, endpoint: &str) -> Option<DateTime<Utc>> {
        self.watermarks.get(endpoint).map(Watermark::timestamp)
    }

    /// Wait until all spawned dispatch/handler tasks have finished.
    /// Intended for tests.
    pub async fn quiesce(&self) {
        while !self.tasks.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // ─── Poll phase ──────────────────────────────────────────────────

    /// Poll every named endpoint concurrently; returns the strictly-new
    /// entries per endpoint after watermark dedup.
    async fn poll_endpoints(&mut self, names: &[String]) -> HashMap<String, Vec<LogEntry>> {
        let mut polls = JoinSet::new();
        for name in names {
            if self.registry.get(name).is_none() {
                continue;
            }
            let panel = Arc::clone(&self.panel);
            let poll_timeout = self.opts.poll_timeout;
            let name = name.clone();
            polls.spawn(async move {
                let result = tokio::time::timeout(poll_timeout, panel.get_updates(&name)).await;
                (name, result)
            });
        }

        let mut fresh = HashMap::new();
        while let Some(joined) = polls.join_next().await {
            let Ok((name, result)) = joined else { continue };
            let batch = match result {
                Ok(Ok(batch)) => {
                    self.tracker(&name).record_success();
                    batch
                }
                Ok(Err(err)) => {
                    tracing::debug!("poll failed for {name}: {err}");
                    self.record_poll_failure(&name).await;
                    continue;
                }
                Err(_) => {
                    tracing::debug!("poll timed out for {name}");
                    self.record_poll_failure(&name).await;
                    continue;
                }
            };

            // Rows without a usable timestamp are dropped at the parse
            // boundary.
            let entries: Vec<LogEntry> = batch.iter().filter_map(LogEntry::parse).collect();
            match self.watermarks.get_mut(&name) {
                Some(mark) => {
                    let accepted = mark.advance(entries);
                    if !accepted.is_empty() {
                        fresh.insert(name, accepted);
                    }
                }
                None => {
                    // First successful poll: consume the backlog silently so
                    // startup does not flood the bridge.
                    self.watermarks
                        .insert(name.clone(), Watermark::seed(&entries, Utc::now()));
                }
            }
        }
        fresh
    }

    fn tracker(&mut self, name: &str) -> &mut FailureTracker {
        let threshold = self.opts.failure_threshold;
        self.failures
            .entry(name.to_owned())
            .or_insert_with(|| FailureTracker::new(threshold))
    }

    async fn record_poll_failure(&mut self, name: &str) {
        if self.tracker(name).record_failure() == HealAction::ResetSession {
            tracing::warn!("connection to {name} is unstable, resetting panel session");
            self.panel.invalidate_session(name).await;
        }
    }

    // ─── Classification phase ────────────────────────────────────────

    /// Run accepted entries through the pending-command scan and the
    /// filter chain, diverting in-band commands to handler tasks. Returns
    /// `(sender, content)` candidates per source endpoint.
    fn classify_and_intercept(
        &self,
        fresh: HashMap<String, Vec<LogEntry>>,
    ) -> HashMap<String, Vec<(String, String)>> {
        let mut candidates = HashMap::new();
        for (name, entries) in fresh {
            let mut plain = Vec::new();
            for entry in entries {
                // Awaited console responses are usually non-chat lines, so
                // the pending scan runs before the filter chain.
                self.pending.match_line(&name, &entry.content);

                if let Some(rule) = filter::rejecting_rule(&entry) {
                    tracing::debug!("dropped line from {name} ({rule})");
                    continue;
                }
                match command::parse(&entry.content) {
                    Some(cmd) => {
                        let Some(ctx) = self.command_ctx(&name, &entry.sender) else {
                            continue;
                        };
                        tracing::debug!("intercepted {cmd:?} from {} on {name}", entry.sender);
                        self.tasks.spawn(commands::handle(cmd, ctx));
                    }
                    None => plain.push((entry.sender, entry.content)),
                }
            }
            if !plain.is_empty() {
                candidates.insert(name, plain);
            }
        }
        candidates
    }

    fn group_context(&self, group_name: &str, group: &Group) -> GroupContext {
        let members = self.registry.resolve_members(&group.members);
        let displays = members
            .iter()
            .map(|member| (member.name.clone(), self.topology.doc().display(&member.name)))
            .collect();
        GroupContext {
            name: group_name.to_owned(),
            members,
            displays,
            sink_channel: group.sink_channel.clone(),
        }
    }

    /// Handler context for a command typed on `source`, using the first
    /// active group the endpoint belongs to.
    fn command_ctx(&self, source: &str, sender: &str) -> Option<CommandCtx> {
        let doc = self.topology.doc();
        let (group_name, group) = doc
            .active_groups()
            .find(|(_, group)| group.members.iter().any(|member| member == source))?;
        let endpoint = self.registry.get(source)?.clone();
        Some(CommandCtx {
            panel: Arc::clone(&self.panel),
            sink: self.sink.clone(),
            pending: Arc::clone(&self.pending),
            tasks: self.tasks.clone(),
            source: endpoint,
            sender: sender.to_owned(),
            group: self.group_context(group_name, group),
            send_timeout: self.opts.send_timeout,
        })
    }

    // ─── Dispatch phase ──────────────────────────────────────────────

    fn dispatch_tick(&mut self, candidates: &HashMap<String, Vec<(String, String)>>) {
        let doc = self.topology.doc().clone();
        for (group_name, group) in doc.active_groups() {
            let ctx = self.group_context(group_name, group);
            for source in &ctx.members {
                let Some(messages) = candidates.get(&source.name) else {
                    continue;
                };
                let display = ctx.display_for(&source.name);
                for (sender, content) in messages {
                    dispatch::fanout_chat(
                        &self.tasks,
                        &self.panel,
                        self.sink.as_ref(),
                        ctx.sink_channel.as_deref(),
                        &ctx.members,
                        source,
                        &display,
                        sender,
                        content,
                        self.opts.send_timeout,
                    );
                }
            }
            if ctx.sink_channel.is_some() {
                self.maybe_refresh_topic(&ctx);
            }
        }
    }

    /// Refresh a sinked group's channel topic, at most once per
    /// [`presence::TOPIC_MIN_INTERVAL_SECS`]. The mark is set when the
    /// task is spawned: detached tasks must not write engine state back.
    fn maybe_refresh_topic(&mut self, ctx: &GroupContext) {
        let Some(channel) = ctx.sink_channel.clone() else { return };
        let Some(sink) = self.sink.clone() else { return };

        let now = Utc::now();
        let due = self.topic_marks.get(&ctx.name).is_none_or(|mark| {
            now.signed_duration_since(*mark)
                >= chrono::Duration::seconds(presence::TOPIC_MIN_INTERVAL_SECS)
        });
        if !due {
            return;
        }
        self.topic_marks.insert(ctx.name.clone(), now);

        let panel = Arc::clone(&self.panel);
        let queries = ctx.roster_queries();
        let lookup_timeout = self.opts.send_timeout;
        self.tasks.spawn(async move {
            let roster = presence::online_players(panel, queries, lookup_timeout).await;
            let topic = presence::topic_line(&roster);
            if let Err(err) = sink.set_topic(&channel, &topic).await {
                tracing::debug!("topic update for {channel} failed: {err}");
            }
        });
    }
}
