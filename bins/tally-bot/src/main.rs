//! Tally bot binary.
//!
//! Loads the configuration, opens the RocksDB ledger and serves the referral
//! program over a line-oriented console gateway: inbound events are JSON
//! lines on stdin, outbound messages are JSON lines on stdout. Logs go to
//! stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use tally_core::event::InboundEvent;
use tally_node_lib::console::{ConsoleTransport, ListOracle};
use tally_node_lib::{Node, NodeConfig};

/// Capacity of the inbound event queue.
const EVENT_QUEUE: usize = 256;

/// Tally referral bot.
#[derive(Parser, Debug)]
#[command(name = "tally-bot", version, about = "Channel referral bot with a durable ledger")]
struct Args {
    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory for the ledger (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Administrator user id (overrides the config file)
    #[arg(long)]
    admin_id: Option<i64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,
}

impl Args {
    /// Layer CLI overrides over the loaded configuration.
    fn into_config(self) -> anyhow::Result<(NodeConfig, String)> {
        let mut config = NodeConfig::load(self.config.as_deref())
            .context("failed to load configuration")?;
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(admin_id) = self.admin_id {
            config.admin_id = admin_id;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        Ok((config, self.log_format))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, log_format) = Args::parse().into_config()?;
    init_logging(&config.log_level, &log_format);

    if config.admin_id == 0 {
        bail!("admin_id is not set (use --admin-id or TALLY_ADMIN_ID)");
    }

    info!("Tally bot v{}", env!("CARGO_PKG_VERSION"));
    info!(data_dir = ?config.data_dir, channel = %config.channel, admin = config.admin_id, "starting");

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data_dir {:?}", config.data_dir))?;

    let oracle = Arc::new(ListOracle::new(config.members.iter().copied()));
    let transport = Arc::new(ConsoleTransport::stdout());
    let mut node = Node::open(&config, oracle, transport).context("failed to open ledger")?;

    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    tokio::spawn(read_events(tx));

    info!("Tally bot running (Ctrl+C to stop)");

    tokio::select! {
        _ = node.run(rx) => {
            info!("input closed");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("shutdown signal received");
        }
    }

    info!("Tally bot shutdown complete");
    Ok(())
}

/// Parse stdin lines into events until EOF or until the node goes away.
async fn read_events(tx: mpsc::Sender<InboundEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundEvent>(&line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "skipping malformed event line"),
        }
    }
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. Output goes to stderr so it never mixes
/// with the gateway's stdout stream.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
