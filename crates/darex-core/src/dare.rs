//! Dares and their lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, deadline::Deadline};

/// Where a dare is in its lifecycle. Status only ever moves forward:
/// open → voting → completed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
pub enum DareStatus {
  /// Accepting participants and proof. Older rows may carry the label
  /// `active`, which decodes to the same state.
  #[strum(to_string = "open", serialize = "active")]
  Open,
  #[strum(to_string = "voting")]
  Voting,
  #[strum(to_string = "completed")]
  Completed,
}

impl DareStatus {
  /// Check that moving from `self` to `next` does not go backwards.
  pub fn advance_to(self, next: DareStatus) -> Result<DareStatus> {
    if next < self {
      return Err(Error::BackwardTransition {
        from: self.to_string(),
        to:   next.to_string(),
      });
    }
    Ok(next)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dare {
  pub id:             i64,
  pub title:          String,
  pub description:    String,
  pub reward:         f64,
  /// Wallet address of the creator.
  pub creator:        String,
  pub deadline:       Deadline,
  pub difficulty:     Option<String>,
  pub category:       Option<String>,
  pub location:       Option<String>,
  pub featured:       bool,
  pub status:         DareStatus,
  pub participants:   i64,
  pub likes:          i64,
  pub comments:       i64,
  pub created_at:     DateTime<Utc>,
  /// Id of the matching dare in the escrow contract, if known.
  pub chain_dare_id:  Option<u64>,
  /// Winning wallet once the dare is completed.
  pub winner:         Option<String>,
  pub reward_claimed: bool,
}

impl Dare {
  pub fn expires_at(&self) -> Option<DateTime<Utc>> { self.deadline.expires_at(self.created_at) }
}

/// Input to [`crate::store::DareStore::create_dare`]. `created_at` and all
/// counters are set by the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDare {
  pub title:         String,
  pub description:   String,
  pub reward:        f64,
  pub creator:       String,
  pub deadline:      Deadline,
  pub difficulty:    Option<String>,
  pub category:      Option<String>,
  pub location:      Option<String>,
  #[serde(default)]
  pub featured:      bool,
  pub chain_dare_id: Option<u64>,
}

impl NewDare {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>,
    reward: f64,
    creator: impl Into<String>,
    deadline: Deadline,
  ) -> Self {
    Self {
      title: title.into(),
      description: description.into(),
      reward,
      creator: creator.into(),
      deadline,
      difficulty: None,
      category: None,
      location: None,
      featured: false,
      chain_dare_id: None,
    }
  }
}

/// A dare annotated with the viewing wallet's relationship to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DareListing {
  #[serde(flatten)]
  pub dare:         Dare,
  pub has_accepted: bool,
  pub has_liked:    bool,
}

/// Acceptance record linking a user to a dare.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDare {
  pub id:          i64,
  pub user_id:     i64,
  pub dare_id:     i64,
  pub accepted_at: DateTime<Utc>,
}

/// Outcome of one deadline sweep.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
  /// Open dares whose deadline had passed and are now in voting.
  pub advanced: Vec<i64>,
  /// Rows that could not be evaluated, with the reason.
  pub failed:   Vec<(i64, String)>,
}
