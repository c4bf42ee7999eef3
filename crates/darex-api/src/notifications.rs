//! Handlers for notifications and notification settings.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | `?walletAddress=&unreadOnly=true` |
//! | `POST` | `/notifications/:id/read` | Body: `{walletAddress}` of the owner |
//! | `POST` | `/notifications/read-all` | Body: `{walletAddress}` |
//! | `GET`  | `/settings/notifications/:walletAddress` | Defaults all on |
//! | `PUT`  | `/settings/notifications` | Upsert |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use darex_core::{
  notification::{Notification, NotificationSettings},
  store::DareStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  response::{ApiJson, ApiQuery, Envelope, required, success},
  users::WalletBody,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub wallet_address: Option<String>,
  #[serde(default)]
  pub unread_only:    bool,
}

/// `GET /notifications`
pub async fn list<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Envelope<Vec<Notification>>>, ApiError> {
  let wallet = required(params.wallet_address, "walletAddress")?;
  let notes = store
    .list_notifications(wallet, params.unread_only)
    .await
    .map_err(ApiError::store)?;
  Ok(success(notes))
}

/// `POST /notifications/:id/read`
pub async fn mark_read<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  ApiJson(body): ApiJson<WalletBody>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  store.mark_notification_read(wallet, id).await.map_err(ApiError::store)?;
  Ok(success(serde_json::json!({ "id": id, "isRead": true })))
}

#[derive(Debug, Serialize)]
pub struct ReadAll {
  pub updated: usize,
}

/// `POST /notifications/read-all`
pub async fn mark_all_read<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<WalletBody>,
) -> Result<Json<Envelope<ReadAll>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let updated = store.mark_all_read(wallet).await.map_err(ApiError::store)?;
  Ok(success(ReadAll { updated }))
}

/// `GET /settings/notifications/:walletAddress`
pub async fn get_settings<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(wallet): Path<String>,
) -> Result<Json<Envelope<NotificationSettings>>, ApiError> {
  let settings = store
    .notification_settings(wallet)
    .await
    .map_err(ApiError::store)?;
  Ok(success(settings))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
  pub wallet_address: Option<String>,
  #[serde(flatten)]
  pub settings:       NotificationSettings,
}

/// `PUT /settings/notifications`
pub async fn put_settings<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<SettingsBody>,
) -> Result<Json<Envelope<NotificationSettings>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let saved = store
    .update_notification_settings(wallet, body.settings)
    .await
    .map_err(ApiError::store)?;
  Ok(success(saved))
}
