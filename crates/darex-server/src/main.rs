//! darex server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `DAREX_*` environment variables, opens the SQLite store, starts the
//! deadline sweeper, and serves the JSON API over HTTP until Ctrl-C.
//!
//! ```toml
//! host       = "127.0.0.1"
//! port       = 3001
//! store_path = "~/.local/share/darex/darex.db"
//! sweep_interval_secs = 60
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use darex_server::{ServerConfig, router, run_sweeper, sweep_once};
use darex_store_sqlite::SqliteStore;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "DareX API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run a single deadline sweep and exit.
  #[arg(long)]
  sweep_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("DAREX"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create store directory {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  if cli.sweep_once {
    let report = sweep_once(store.as_ref()).await.context("sweep failed")?;
    tracing::info!(
      advanced = report.advanced.len(),
      failed = report.failed.len(),
      "sweep complete"
    );
    return Ok(());
  }

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let sweeper = tokio::spawn(run_sweeper(
    Arc::clone(&store),
    server_cfg.sweep_interval(),
    shutdown_rx,
  ));

  let app = router(store);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()))
    .await
    .context("server error")?;

  shutdown_tx.send(true).ok();
  if let Err(err) = sweeper.await {
    tracing::error!("sweeper task join error: {err}");
  }

  Ok(())
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
  if let Err(err) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for shutdown signal: {err}");
    return;
  }
  shutdown_tx.send(true).ok();
  tracing::info!("shutdown signal received");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
