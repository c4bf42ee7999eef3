//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/users/findOrCreate` | Body: `{"walletAddress":"0x.."}` |
//! | `DELETE` | `/users/:walletAddress` | Cascading account deletion |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  response::IntoResponse,
};
use darex_core::store::DareStore;
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  response::{ApiJson, Envelope, required, success},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBody {
  pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOrCreated {
  pub user_id:     i64,
  pub is_new_user: bool,
}

/// `POST /users/findOrCreate`
pub async fn find_or_create<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<WalletBody>,
) -> Result<Json<Envelope<FindOrCreated>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let (user, is_new_user) = store
    .find_or_create_user(wallet)
    .await
    .map_err(ApiError::store)?;
  Ok(success(FindOrCreated { user_id: user.id, is_new_user }))
}

/// `DELETE /users/:walletAddress`
pub async fn delete<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(wallet): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
  store.delete_user(wallet.clone()).await.map_err(ApiError::store)?;
  tracing::info!(%wallet, "account deleted");
  Ok(success(serde_json::json!({ "walletAddress": wallet })))
}
