//! chatlink: cross-console chat bridge binary.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use chatlink_panel::{HttpPanel, PanelApi, PanelCredentials};
use chatlink_runtime::cli::{Cli, CheckOpts, Command, DaemonOpts};
use chatlink_runtime::config::TopologyFile;
use chatlink_runtime::engine::{Engine, EngineOptions};
use chatlink_sink::{ChatSink, WebhookSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Command::Daemon(opts) => run_daemon(opts).await,
        Command::Check(opts) => check_topology(&opts),
    }
}

async fn run_daemon(opts: DaemonOpts) -> anyhow::Result<()> {
    let filter = std::env::var("CHATLINK_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    tracing::info!("chatlink daemon starting");

    let topology = TopologyFile::load(&opts.config)?;
    let poll_timeout = Duration::from_millis(opts.poll_timeout_ms);
    let send_timeout = Duration::from_millis(opts.send_timeout_ms);

    let credentials = PanelCredentials {
        username: opts.panel_user,
        password: opts.panel_pass,
    };
    let panel: Arc<dyn PanelApi> =
        Arc::new(HttpPanel::new(&opts.panel_url, credentials, poll_timeout)?);
    let sink: Option<Arc<dyn ChatSink>> = match opts.sink_url {
        Some(url) => {
            Some(Arc::new(WebhookSink::new(url, opts.sink_token, send_timeout)?) as Arc<dyn ChatSink>)
        }
        None => None,
    };

    let engine = Engine::new(
        panel,
        sink,
        topology,
        EngineOptions {
            tick: Duration::from_millis(opts.tick_ms),
            poll_timeout,
            send_timeout,
            failure_threshold: opts.failure_threshold,
        },
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    engine.run(cancel).await;
    tracing::info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}

fn check_topology(opts: &CheckOpts) -> anyhow::Result<()> {
    let topology = TopologyFile::load(&opts.config)?;
    let doc = topology.doc();

    println!("{} group(s):", doc.groups.len());
    let mut names: Vec<&String> = doc.groups.keys().collect();
    names.sort();
    for name in names {
        let group = &doc.groups[name];
        let state = if group.active { "active" } else { "disabled" };
        let sink = group
            .sink_channel
            .as_deref()
            .map(|channel| format!(", sink {channel}"))
            .unwrap_or_default();
        println!("  {name} ({state}): {} member(s){sink}", group.members.len());
        for member in &group.members {
            let display = doc.display(member);
            println!("    {member} -> [{}] ({})", display.alias, display.color);
        }
    }
    Ok(())
}
