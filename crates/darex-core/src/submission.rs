//! Proof submissions and community votes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::dare::{Dare, DareStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionStatus {
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub id:          i64,
  pub dare_id:     i64,
  pub user_id:     i64,
  pub description: String,
  /// Content identifier of the proof in external content-addressed storage.
  #[serde(rename = "fileCID")]
  pub file_cid:    String,
  pub status:      SubmissionStatus,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::DareStore::submit_proof`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
  pub dare_id:        i64,
  pub wallet_address: String,
  pub description:    String,
  #[serde(rename = "fileCID")]
  pub file_cid:       String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VoteChoice {
  Yes,
  No,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
  pub id:            i64,
  pub submission_id: i64,
  pub user_id:       i64,
  pub vote:          VoteChoice,
  pub created_at:    DateTime<Utc>,
}

/// Vote counts for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
  pub yes: i64,
  pub no:  i64,
}

impl Tally {
  /// Share of yes votes; zero when nobody has voted.
  pub fn approval(&self) -> f64 {
    let total = self.yes + self.no;
    if total == 0 { 0.0 } else { self.yes as f64 / total as f64 }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TalliedSubmission {
  #[serde(flatten)]
  pub submission:     Submission,
  pub wallet_address: String,
  pub votes:          Tally,
}

/// Where a dare's judging stands, as shown on the voting screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VotingPhase {
  /// Still open; proof is being collected.
  Submissions,
  /// In voting and the tally currently produces a winner.
  CommunityVoting,
  /// In voting, votes have been cast, and no submission leads the tally.
  /// The creator has to name the winner when finalizing.
  OrganizerSelection,
  Completed,
}

impl VotingPhase {
  pub fn of(status: DareStatus, submissions: &[TalliedSubmission]) -> Self {
    match status {
      DareStatus::Open => Self::Submissions,
      DareStatus::Completed => Self::Completed,
      DareStatus::Voting
        if submissions.iter().any(|s| s.votes.yes + s.votes.no > 0)
          && pick_winner(submissions).is_none() =>
      {
        Self::OrganizerSelection
      }
      DareStatus::Voting => Self::CommunityVoting,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingSummary {
  pub dare:              Dare,
  pub total_submissions: usize,
  /// When voting closed. Voting stays open until the creator finalizes, so
  /// this is `None` until the dare completes.
  pub voting_ends:       Option<DateTime<Utc>>,
  pub phase:             VotingPhase,
  pub submissions:       Vec<TalliedSubmission>,
}

impl VotingSummary {
  pub fn new(
    dare: Dare,
    submissions: Vec<TalliedSubmission>,
    voting_ends: Option<DateTime<Utc>>,
  ) -> Self {
    Self {
      phase: VotingPhase::of(dare.status, &submissions),
      total_submissions: submissions.len(),
      voting_ends,
      dare,
      submissions,
    }
  }
}

/// Pick the winner by community tally: highest approval ratio, then most yes
/// votes, then earliest submission. A submission only wins with more yes
/// than no votes.
pub fn pick_winner(candidates: &[TalliedSubmission]) -> Option<&TalliedSubmission> {
  candidates
    .iter()
    .filter(|c| c.votes.yes > c.votes.no)
    .max_by(|a, b| {
      a.votes
        .approval()
        .total_cmp(&b.votes.approval())
        .then(a.votes.yes.cmp(&b.votes.yes))
        .then(b.submission.id.cmp(&a.submission.id))
    })
}

/// Outcome of finalizing a dare.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finalization {
  pub dare_id:            i64,
  pub winner:             Option<String>,
  pub winning_submission: Option<i64>,
  pub reward:             f64,
}
