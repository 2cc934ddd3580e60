//! `siftd`: classify the output of agent sessions and serve the results.

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use sift_core::config::SiftConfig;
use sift_server::{Daemon, SessionSource};

/// sift daemon -- pattern extraction over agent terminal output.
#[derive(Parser, Debug)]
#[command(name = "siftd", version, about)]
struct Cli {
    /// Configuration file (TOML). `SIFT_*` variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog file applied on top of the config's seed patterns
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Session to follow, as NAME=PATH. Repeatable.
    #[arg(long = "session", value_name = "NAME=PATH")]
    sessions: Vec<SessionSource>,

    /// Override `server.listen`
    #[arg(long)]
    listen: Option<String>,

    /// Run the learning scheduler regardless of `learning.enable_training`
    #[arg(long)]
    learn: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = SiftConfig::load(cli.config.as_deref())?;
    if let Some(listen) = cli.listen {
        config.server.listen = listen;
    }
    if cli.learn {
        config.learning.enable_training = true;
    }
    sift_observability::init_tracing_from_config(&config.observability);

    let mut daemon = Daemon::open(config)?;
    if let Some(path) = &cli.catalog {
        daemon.load_catalog(path)?;
    }
    for source in &cli.sessions {
        daemon.attach(source).await?;
    }
    daemon.start_learning();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received; shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for interrupts");
                // Dropping the sender would stop the server.
                std::future::pending::<()>().await;
            }
        }
    });

    daemon.run(shutdown_rx).await
}
