//! CLI definition using clap derive.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatlink", version, about = "cross-console chat bridge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the bridge daemon (tick loop + dispatchers)
    Daemon(DaemonOpts),
    /// Validate a topology file and print a summary
    Check(CheckOpts),
}

#[derive(clap::Args)]
pub struct DaemonOpts {
    /// Topology config file (JSON)
    #[arg(long, default_value = "chatlink.json")]
    pub config: PathBuf,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "2000")]
    pub tick_ms: u64,

    /// Per-endpoint poll timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub poll_timeout_ms: u64,

    /// Per-destination send timeout in milliseconds
    #[arg(long, default_value = "5000")]
    pub send_timeout_ms: u64,

    /// Consecutive poll failures before a session reset
    #[arg(long, default_value = "5")]
    pub failure_threshold: u32,

    /// Control panel base URL
    #[arg(long, env = "CHATLINK_PANEL_URL")]
    pub panel_url: String,

    /// Control panel username
    #[arg(long, env = "CHATLINK_PANEL_USER")]
    pub panel_user: String,

    /// Control panel password
    #[arg(long, env = "CHATLINK_PANEL_PASS", hide_env_values = true)]
    pub panel_pass: String,

    /// Chat-UI sink base URL (omit to disable sink forwarding)
    #[arg(long, env = "CHATLINK_SINK_URL")]
    pub sink_url: Option<String>,

    /// Bearer token for the sink API
    #[arg(long, env = "CHATLINK_SINK_TOKEN", hide_env_values = true)]
    pub sink_token: Option<String>,
}

#[derive(clap::Args)]
pub struct CheckOpts {
    /// Topology config file (JSON)
    #[arg(long, default_value = "chatlink.json")]
    pub config: PathBuf,
}
