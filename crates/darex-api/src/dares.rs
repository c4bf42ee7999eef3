//! Handlers for `/dares` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dares` | Optional `?walletAddress=&status=open\|voting\|completed` |
//! | `POST` | `/dares` | 201 with the new dare |
//! | `GET`  | `/dares/:id` | 404 if not found |
//! | `POST` | `/dares/:id/accept` | 201; 409 if already accepted or not open |
//! | `POST` | `/dares/:id/like` | Toggle |
//! | `GET`  | `/dares/:id/voting` | Submissions with tallies |
//! | `POST` | `/dares/:id/finalize` | Creator only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  response::IntoResponse,
};
use darex_core::{
  dare::{Dare, DareListing, DareStatus, NewDare},
  deadline::Deadline,
  social::LikeToggle,
  store::DareStore,
  submission::{Finalization, VotingSummary},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  response::{ApiJson, ApiQuery, Envelope, created, required, success},
  users::WalletBody,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub wallet_address: Option<String>,
  pub status:         Option<DareStatus>,
}

/// `GET /dares`
pub async fn list<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Envelope<Vec<DareListing>>>, ApiError> {
  let dares = store
    .list_dares(params.wallet_address, params.status)
    .await
    .map_err(ApiError::store)?;
  Ok(success(dares))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub reward:        Option<f64>,
  pub creator:       Option<String>,
  pub deadline:      Option<String>,
  pub difficulty:    Option<String>,
  pub category:      Option<String>,
  pub location:      Option<String>,
  #[serde(default)]
  pub featured:      bool,
  pub chain_dare_id: Option<u64>,
}

impl CreateBody {
  fn into_new_dare(self) -> Result<NewDare, ApiError> {
    let deadline: Deadline = required(self.deadline, "deadline")?
      .parse()
      .map_err(|e: darex_core::Error| ApiError::BadRequest(e.to_string()))?;
    let reward = self.reward.ok_or_else(|| ApiError::missing("reward"))?;
    Ok(NewDare {
      title: required(self.title, "title")?,
      description: required(self.description, "description")?,
      reward,
      creator: required(self.creator, "creator")?,
      deadline,
      difficulty: self.difficulty,
      category: self.category,
      location: self.location,
      featured: self.featured,
      chain_dare_id: self.chain_dare_id,
    })
  }
}

/// `POST /dares`
pub async fn create<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body.into_new_dare()?;
  let dare = store.create_dare(input).await.map_err(ApiError::store)?;
  tracing::info!(dare_id = dare.id, creator = %dare.creator, "dare created");
  Ok(created(dare))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /dares/:id`
pub async fn get_one<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Envelope<Dare>>, ApiError> {
  let dare = store
    .get_dare(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("dare {id}")))?;
  Ok(success(dare))
}

// ─── Participation ────────────────────────────────────────────────────────────

/// `POST /dares/:id/accept`
pub async fn accept<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<WalletBody>,
) -> Result<impl IntoResponse, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let accepted = store.accept_dare(wallet, id).await.map_err(ApiError::store)?;
  Ok(created(accepted))
}

/// `POST /dares/:id/like`
pub async fn like<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<WalletBody>,
) -> Result<Json<Envelope<LikeToggle>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let toggle = store.toggle_dare_like(wallet, id).await.map_err(ApiError::store)?;
  Ok(success(toggle))
}

// ─── Voting ───────────────────────────────────────────────────────────────────

/// `GET /dares/:id/voting`
pub async fn voting<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Envelope<VotingSummary>>, ApiError> {
  let summary = store
    .voting_summary(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("dare {id}")))?;
  Ok(success(summary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeBody {
  pub wallet_address: Option<String>,
  pub submission_id:  Option<i64>,
}

/// `POST /dares/:id/finalize`
pub async fn finalize<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<FinalizeBody>,
) -> Result<Json<Envelope<Finalization>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let outcome = store
    .finalize_dare(wallet, id, body.submission_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(dare_id = id, winner = ?outcome.winner, "dare finalized");
  Ok(success(outcome))
}
