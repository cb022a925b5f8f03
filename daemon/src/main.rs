//! eggvote daemon — entry point for running the voting service.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use eggvote_node::{init_logging, LogFormat, NodeConfig, VotingNode};
use eggvote_rpc::RpcServer;

#[derive(Parser)]
#[command(name = "eggvote-daemon", about = "Round-based candidate voting service")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "EGGVOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "EGGVOTE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Listen address for the HTTP API, e.g. "0.0.0.0:8080".
    #[arg(long, env = "EGGVOTE_LISTEN")]
    listen: Option<String>,

    /// Log output format: "human" or "json".
    #[arg(long, env = "EGGVOTE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "EGGVOTE_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Layer CLI flags (and their env fallbacks) over the file config.
    fn apply(self, mut config: NodeConfig) -> NodeConfig {
        if let Some(data_dir) = self.data_dir {
            config.node.data_dir = data_dir;
        }
        if let Some(listen) = self.listen {
            config.rpc.listen = listen;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match cli.config.as_deref() {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    let config = cli.apply(base);

    init_logging(
        LogFormat::from_config(&config.logging.format),
        &config.logging.level,
    );

    let listen = config.listen_addr()?;
    let cors_allow_any = config.rpc.cors_allow_any;

    let mut node = VotingNode::new(config)?;
    node.start().await?;

    let rpc = RpcServer::new(
        listen,
        cors_allow_any,
        node.engine.clone(),
        node.metrics.clone(),
    );

    // The signal waiter trips the same controller the node's background
    // tasks and the HTTP server's graceful shutdown listen on.
    let signals = node.shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    rpc.serve(node.shutdown.clone()).await?;

    tracing::info!("shutdown signal received, stopping node");
    node.stop().await?;

    tracing::info!("eggvote daemon exited cleanly");
    Ok(())
}
