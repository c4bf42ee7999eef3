//! Handlers for proof submissions and votes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/submissions` | Body: `{dareId, walletAddress, description, fileCID}` |
//! | `GET`  | `/submission` | `?dareId=&walletAddress=`; 404 if none |
//! | `POST` | `/submissions/:id/vote` | Body: `{walletAddress, vote: "yes"\|"no"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  response::IntoResponse,
};
use darex_core::{
  store::DareStore,
  submission::{NewSubmission, Submission, VoteChoice},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  response::{ApiJson, ApiQuery, Envelope, created, required, success},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
  pub dare_id:        Option<i64>,
  pub wallet_address: Option<String>,
  pub description:    Option<String>,
  #[serde(rename = "fileCID")]
  pub file_cid:       Option<String>,
}

/// `POST /submissions`
pub async fn create<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<SubmitBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewSubmission {
    dare_id:        body.dare_id.ok_or_else(|| ApiError::missing("dareId"))?,
    wallet_address: required(body.wallet_address, "walletAddress")?,
    description:    required(body.description, "description")?,
    file_cid:       required(body.file_cid, "fileCID")?,
  };
  let submission = store.submit_proof(input).await.map_err(ApiError::store)?;
  Ok(created(submission))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupParams {
  pub dare_id:        Option<i64>,
  pub wallet_address: Option<String>,
}

/// `GET /submission?dareId=&walletAddress=`
pub async fn get_one<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<LookupParams>,
) -> Result<Json<Envelope<Submission>>, ApiError> {
  let dare_id = params.dare_id.ok_or_else(|| ApiError::missing("dareId"))?;
  let wallet = required(params.wallet_address, "walletAddress")?;
  let submission = store
    .get_submission(dare_id, wallet)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("submission not found".into()))?;
  Ok(success(submission))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteBody {
  pub wallet_address: Option<String>,
  pub vote:           Option<VoteChoice>,
}

/// `POST /submissions/:id/vote`
pub async fn vote<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(submission_id): Path<i64>,
  ApiJson(body): ApiJson<VoteBody>,
) -> Result<impl IntoResponse, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let choice = body.vote.ok_or_else(|| ApiError::missing("vote"))?;
  let vote = store
    .cast_vote(wallet, submission_id, choice)
    .await
    .map_err(ApiError::store)?;
  Ok(created(vote))
}
