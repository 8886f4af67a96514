//! Logscope - live viewer backend for session console and network logs.

use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use logscope::config::ViewerConfig;
use logscope::server::{ServerConfig, ServerError, ViewerServer};
use logscope::store::LogStore;
use logscope::watcher::{ChangeNotifier, WatchService};

#[derive(Parser)]
#[command(
    name = "logscope",
    about = "Live viewer for session console and network logs",
    version
)]
struct Cli {
    /// Root directories to scan for session logs.
    #[arg(value_name = "ROOT")]
    roots: Vec<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Host address to bind to.
    #[arg(long)]
    host: Option<String>,

    /// Preferred port; successive ports are tried if it is taken.
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn resolve_config(cli: &Cli) -> ViewerConfig {
    let mut config = match &cli.config {
        Some(path) => match ViewerConfig::load(path) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, "Ignoring unreadable config file");
                ViewerConfig::default()
            }
        },
        None => ViewerConfig::default(),
    };

    if !cli.roots.is_empty() {
        config.roots = cli.roots.clone();
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if config.roots.is_empty() {
        config.roots = ViewerConfig::default_roots();
        tracing::info!(roots = ?config.roots, "No roots given, using defaults");
    }

    config
}

async fn run(config: ViewerConfig) -> Result<(), ServerError> {
    let store = Arc::new(LogStore::with_capacities(
        config.console_capacity,
        config.network_capacity,
    ));
    let watched_files = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();

    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let _notifier =
        ChangeNotifier::spawn(&config.roots, &trigger_tx, config.poll_interval(), &cancel);

    let service = WatchService::new(
        config.roots.clone(),
        Arc::clone(&store),
        trigger_rx,
        Arc::clone(&watched_files),
        cancel.clone(),
    );
    let watch_task = tokio::spawn(service.run());

    let server = ViewerServer::new(store, watched_files, cancel.clone()).with_config(
        ServerConfig {
            host: config.host.clone(),
            port: config.port,
            cors_permissive: true,
        },
    );
    let bound = server.bind().await?;
    tracing::info!(url = %bound.base_url(), "Viewer ready");

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down");
            shutdown.cancel();
        }
    });

    let served = bound.serve().await;
    cancel.cancel();
    let _ = watch_task.await;

    served.map_err(ServerError::from)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli);
    if let Err(error) = run(config).await {
        tracing::error!(%error, "Viewer failed to start");
        std::process::exit(1);
    }
}
