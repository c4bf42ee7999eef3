//! Users, keyed by wallet address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:              i64,
  pub wallet_address:  String,
  pub username:        Option<String>,
  pub bio:             Option<String>,
  pub avatar:          Option<String>,
  pub dares_completed: i64,
  pub dares_created:   i64,
  pub total_earned:    f64,
  /// Percentage (0-100) of decided votes that matched the outcome.
  pub voting_accuracy: i64,
  pub current_streak:  i64,
  pub longest_streak:  i64,
  /// Competition rank by `dares_completed`; computed on read.
  pub rank:            i64,
  pub created_at:      DateTime<Utc>,
}

/// Fields a user may change on their own profile. `None` leaves the stored
/// value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub username: Option<String>,
  pub bio:      Option<String>,
  pub avatar:   Option<String>,
}

/// Profile statistics page payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
  #[serde(flatten)]
  pub user:        User,
  pub total_users: i64,
  pub votes_cast:  i64,
}
