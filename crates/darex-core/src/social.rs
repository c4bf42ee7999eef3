//! Likes and threaded comments on dares.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a like/unlike toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
  /// Whether the caller likes the target after the toggle.
  pub liked: bool,
  /// The target's like counter after the toggle.
  pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id:          i64,
  pub dare_id:     i64,
  pub user_id:     i64,
  pub comment:     String,
  /// Parent comment for replies. Threads are built from this pointer alone.
  pub replying_to: Option<i64>,
  pub likes:       i64,
  pub created_at:  DateTime<Utc>,
}

/// A comment as shown to a particular viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
  #[serde(flatten)]
  pub comment:            Comment,
  pub wallet_address:     String,
  pub username:           Option<String>,
  /// Author of the parent comment, for reply context.
  pub replying_to_wallet: Option<String>,
  pub has_liked:          bool,
}
