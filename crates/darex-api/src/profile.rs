//! Handlers for profiles, the leaderboard, and achievements.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use darex_core::{
  achievement::Achievement,
  activity::Activity,
  leaderboard::LeaderboardEntry,
  store::DareStore,
  user::{ProfileStats, ProfileUpdate, User},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  response::{ApiJson, ApiQuery, Envelope, required, success},
};

const DEFAULT_LEADERBOARD_LIMIT: usize = 100;
const DEFAULT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
  pub limit: Option<usize>,
}

/// `GET /leaderboard[?limit=N]`
pub async fn leaderboard<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<LeaderboardParams>,
) -> Result<Json<Envelope<Vec<LeaderboardEntry>>>, ApiError> {
  let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
  let entries = store.leaderboard(limit).await.map_err(ApiError::store)?;
  Ok(success(entries))
}

/// `GET /profile/:walletAddress`
pub async fn get_one<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(wallet): Path<String>,
) -> Result<Json<Envelope<User>>, ApiError> {
  let user = store
    .get_user(wallet)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  Ok(success(user))
}

/// `GET /profile/:walletAddress/stats`
pub async fn stats<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(wallet): Path<String>,
) -> Result<Json<Envelope<ProfileStats>>, ApiError> {
  let stats = store.profile_stats(wallet).await.map_err(ApiError::store)?;
  Ok(success(stats))
}

/// `GET /profile/:walletAddress/achievements`
pub async fn achievements<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(wallet): Path<String>,
) -> Result<Json<Envelope<Vec<Achievement>>>, ApiError> {
  let list = store.achievements(wallet).await.map_err(ApiError::store)?;
  Ok(success(list))
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
  pub limit: Option<usize>,
}

/// `GET /profile/:walletAddress/activities[?limit=N]`
pub async fn activities<S: DareStore>(
  State(store): State<Arc<S>>,
  Path(wallet): Path<String>,
  ApiQuery(params): ApiQuery<ActivityParams>,
) -> Result<Json<Envelope<Vec<Activity>>>, ApiError> {
  let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
  let feed = store.user_activities(wallet, limit).await.map_err(ApiError::store)?;
  Ok(success(feed))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub wallet_address: Option<String>,
  #[serde(flatten)]
  pub update:         ProfileUpdate,
}

/// `PUT /profile`
pub async fn update<S: DareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<UpdateBody>,
) -> Result<Json<Envelope<User>>, ApiError> {
  let wallet = required(body.wallet_address, "walletAddress")?;
  let user = store
    .update_profile(wallet, body.update)
    .await
    .map_err(ApiError::store)?;
  Ok(success(user))
}
