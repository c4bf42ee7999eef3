//! `POST /sync/dares`: reconcile the store with escrow contract snapshots.
//!
//! The body is a JSON array of on-chain dares; rewards are decimal wei
//! strings.

use std::sync::Arc;

use axum::{Json, extract::State};
use darex_core::{
  escrow::OnChainDare,
  store::{DareStore, SyncReport},
};

use crate::{
  error::ApiError,
  response::{ApiJson, Envelope, success},
};

pub async fn handler<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(snapshots): ApiJson<Vec<OnChainDare>>,
) -> Result<Json<Envelope<SyncReport>>, ApiError> {
  let count = snapshots.len();
  let report = store.sync_onchain(snapshots).await.map_err(ApiError::store)?;
  tracing::info!(
    snapshots = count,
    inserted = report.inserted,
    updated = report.updated,
    unchanged = report.unchanged,
    "chain sync applied"
  );
  Ok(success(report))
}
