//! Handlers for dare comments and comment likes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dares/:id/comments` | Optional `?walletAddress=` for `hasLiked` |
//! | `POST` | `/dares/:id/comment` | Body: `{walletAddress, comment, replyingTo?}` |
//! | `POST` | `/comments/:id/like` | Toggle |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  response::IntoResponse,
};
use darex_core::{
  social::{CommentView, LikeToggle},
  store::DareStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  response::{ApiJson, ApiQuery, Envelope, created, required, success},
  users::WalletBody,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerParams {
  pub wallet_address: Option<String>,
}

/// `GET /dares/:id/comments`
pub async fn list<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(dare_id): Path<i64>,
  ApiQuery(params): ApiQuery<ViewerParams>,
) -> Result<Json<Envelope<Vec<CommentView>>>, ApiError> {
  let comments = store
    .list_comments(dare_id, params.wallet_address)
    .await
    .map_err(ApiError::store)?;
  Ok(success(comments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
  pub wallet_address: Option<String>,
  pub comment:        Option<String>,
  pub replying_to:    Option<i64>,
}

/// `POST /dares/:id/comment`
pub async fn create<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(dare_id): Path<i64>,
  ApiJson(body): ApiJson<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let text = required(body.comment, "comment")?;
  let comment = store
    .add_comment(wallet, dare_id, text, body.replying_to)
    .await
    .map_err(ApiError::store)?;
  Ok(created(comment))
}

/// `POST /comments/:id/like`
pub async fn like<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(comment_id): Path<i64>,
  ApiJson(body): ApiJson<WalletBody>,
) -> Result<Json<Envelope<LikeToggle>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let toggle = store
    .toggle_comment_like(wallet, comment_id)
    .await
    .map_err(ApiError::store)?;
  Ok(success(toggle))
}
