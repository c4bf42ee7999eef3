//! DareX HTTP server assembly and the background deadline sweep.
//!
//! The binary in `main.rs` loads [`ServerConfig`], opens the SQLite store,
//! and hands the same `Arc` store to [`router`] and [`run_sweeper`].

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  http::{
    Method,
    header::{ACCEPT, CONTENT_TYPE},
  },
  routing::get,
};
use chrono::Utc;
use darex_core::{dare::SweepReport, store::DareStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{sync::watch, time::sleep};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DAREX_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  #[serde(default = "default_sweep_interval_secs")]
  pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 { 60 }

impl ServerConfig {
  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.sweep_interval_secs.max(1))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/health` plus the JSON API under
/// `/api`, with request tracing and permissive CORS for browser clients.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: DareStore + 'static,
{
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
    .allow_headers([ACCEPT, CONTENT_TYPE])
    .max_age(Duration::from_secs(3600));

  Router::new()
    .route("/health", get(health))
    .nest("/api", darex_api::api_router(store))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Deadline sweep ───────────────────────────────────────────────────────────

/// Run one sweep at the current time and log its outcome.
pub async fn sweep_once<S: DareStore>(store: &S) -> Result<SweepReport, S::Error> {
  let report = store.sweep_expired(Utc::now()).await?;
  for (dare_id, reason) in &report.failed {
    tracing::warn!(dare_id, %reason, "sweep skipped dare");
  }
  if !report.advanced.is_empty() {
    tracing::info!(advanced = ?report.advanced, "dares moved to voting");
  }
  Ok(report)
}

/// Sweep every `interval` until `shutdown` flips to `true`. A failed tick is
/// logged and the loop keeps going.
pub async fn run_sweeper<S: DareStore>(
  store: Arc<S>,
  interval: Duration,
  mut shutdown: watch::Receiver<bool>,
) {
  tracing::info!(?interval, "starting deadline sweeper");
  loop {
    tokio::select! {
      changed = shutdown.changed() => {
        if changed.is_err() || *shutdown.borrow() {
          tracing::info!("deadline sweeper stopping");
          break;
        }
      }
      _ = sleep(interval) => {
        if let Err(err) = sweep_once(store.as_ref()).await {
          tracing::error!(error = %err, "deadline sweep failed");
        }
      }
    }
  }
}
