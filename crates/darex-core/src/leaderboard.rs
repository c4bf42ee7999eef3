//! Leaderboard rows.
//!
//! Ranking uses competition semantics: a user's rank is one more than the
//! number of users with strictly more completed dares, so ties share a rank
//! and the next distinct score skips ahead (10, 10, 5 → 1, 1, 3).

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  pub rank:            i64,
  pub user_id:         i64,
  pub wallet_address:  String,
  pub username:        Option<String>,
  pub avatar:          Option<String>,
  pub dares_completed: i64,
  pub dares_created:   i64,
  pub total_earned:    f64,
  pub current_streak:  i64,
  /// Rank movement since the previous period. Not tracked yet; always 0.
  pub change:          i64,
  /// Not awarded yet; always empty.
  pub badges:          Vec<String>,
}

/// Rank `scores` (in any order) with competition semantics, returning the
/// rank of each input position.
pub fn competition_ranks(scores: &[i64]) -> Vec<i64> {
  scores
    .iter()
    .map(|mine| 1 + scores.iter().filter(|other| *other > mine).count() as i64)
    .collect()
}
