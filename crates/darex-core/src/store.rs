//! The `DareStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `darex-store-sqlite`).
//! The HTTP layer and the sweep loop depend on this abstraction and receive a
//! store handle explicitly; there is no process-wide connection.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  StoreError,
  achievement::Achievement,
  activity::Activity,
  dare::{Dare, DareListing, DareStatus, NewDare, SweepReport, UserDare},
  escrow::OnChainDare,
  leaderboard::LeaderboardEntry,
  notification::{Notification, NotificationSettings},
  social::{Comment, CommentView, LikeToggle},
  submission::{Finalization, NewSubmission, Submission, Vote, VoteChoice, VotingSummary},
  user::{ProfileStats, ProfileUpdate, User},
};

/// Outcome of reconciling on-chain snapshots into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncReport {
  pub inserted:  usize,
  pub updated:   usize,
  pub unchanged: usize,
}

/// Abstraction over a DareX store backend.
///
/// Wallet addresses identify users at this boundary; backends resolve them
/// to row ids. Every method that changes more than one row is atomic.
pub trait DareStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user for `wallet`, creating it if needed. The flag is `true`
  /// when the user was created by this call.
  fn find_or_create_user(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<(User, bool), Self::Error>> + Send + '_;

  fn get_user(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn update_profile(
    &self,
    wallet: String,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn profile_stats(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<ProfileStats, Self::Error>> + Send + '_;

  /// Remove a user and every row that references them.
  fn delete_user(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Dares ─────────────────────────────────────────────────────────────

  fn create_dare(
    &self,
    input: NewDare,
  ) -> impl Future<Output = Result<Dare, Self::Error>> + Send + '_;

  fn get_dare(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Dare>, Self::Error>> + Send + '_;

  /// List dares newest first, annotated with `viewer`'s accept/like state.
  fn list_dares(
    &self,
    viewer: Option<String>,
    status: Option<DareStatus>,
  ) -> impl Future<Output = Result<Vec<DareListing>, Self::Error>> + Send + '_;

  fn accept_dare(
    &self,
    wallet: String,
    dare_id: i64,
  ) -> impl Future<Output = Result<UserDare, Self::Error>> + Send + '_;

  fn toggle_dare_like(
    &self,
    wallet: String,
    dare_id: i64,
  ) -> impl Future<Output = Result<LikeToggle, Self::Error>> + Send + '_;

  /// Move every open dare whose deadline is at or before `now` to voting.
  fn sweep_expired(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<SweepReport, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    wallet: String,
    dare_id: i64,
    text: String,
    replying_to: Option<i64>,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn list_comments(
    &self,
    dare_id: i64,
    viewer: Option<String>,
  ) -> impl Future<Output = Result<Vec<CommentView>, Self::Error>> + Send + '_;

  fn toggle_comment_like(
    &self,
    wallet: String,
    comment_id: i64,
  ) -> impl Future<Output = Result<LikeToggle, Self::Error>> + Send + '_;

  // ── Submissions and voting ────────────────────────────────────────────

  fn submit_proof(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// The most recent submission by `wallet` for `dare_id`.
  fn get_submission(
    &self,
    dare_id: i64,
    wallet: String,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  fn cast_vote(
    &self,
    wallet: String,
    submission_id: i64,
    choice: VoteChoice,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  fn voting_summary(
    &self,
    dare_id: i64,
  ) -> impl Future<Output = Result<Option<VotingSummary>, Self::Error>> + Send + '_;

  /// Complete a dare in voting. Only the creator may finalize; the winner is
  /// `submission_id` if given, otherwise the community tally decides.
  fn finalize_dare(
    &self,
    wallet: String,
    dare_id: i64,
    submission_id: Option<i64>,
  ) -> impl Future<Output = Result<Finalization, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  fn leaderboard(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, Self::Error>> + Send + '_;

  fn achievements(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<Vec<Achievement>, Self::Error>> + Send + '_;

  /// What `wallet` has done, newest first, at most `limit` entries.
  fn user_activities(
    &self,
    wallet: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn list_notifications(
    &self,
    wallet: String,
    unread_only: bool,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Mark one notification read. Only its owner may do so.
  fn mark_notification_read(
    &self,
    wallet: String,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns the number of notifications that changed.
  fn mark_all_read(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn notification_settings(
    &self,
    wallet: String,
  ) -> impl Future<Output = Result<NotificationSettings, Self::Error>> + Send + '_;

  fn update_notification_settings(
    &self,
    wallet: String,
    settings: NotificationSettings,
  ) -> impl Future<Output = Result<NotificationSettings, Self::Error>> + Send + '_;

  // ── Chain projection ──────────────────────────────────────────────────

  /// Reconcile the store with on-chain state. Idempotent: applying the same
  /// snapshots twice changes nothing the second time.
  fn sync_onchain(
    &self,
    snapshots: Vec<OnChainDare>,
  ) -> impl Future<Output = Result<SyncReport, Self::Error>> + Send + '_;
}
