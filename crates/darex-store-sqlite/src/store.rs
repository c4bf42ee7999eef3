//! [`SqliteStore`], the SQLite implementation of [`DareStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use darex_core::{
  achievement::Achievement,
  activity::Activity,
  dare::{Dare, DareListing, DareStatus, NewDare, SweepReport, UserDare},
  escrow::OnChainDare,
  leaderboard::LeaderboardEntry,
  notification::{Notification, NotificationSettings},
  social::{Comment, CommentView, LikeToggle},
  store::{DareStore, SyncReport},
  submission::{Finalization, NewSubmission, Submission, Vote, VoteChoice, VotingSummary},
  user::{ProfileStats, ProfileUpdate, User},
};

use crate::{
  Error, Result,
  schema::SCHEMA,
  sql::{self, dares, notifications, social, sync, users, voting},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A DareX store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted and
/// every clone talks to the same connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the connection thread, keeping its error as our own.
  async fn run<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── DareStore impl ──────────────────────────────────────────────────────────

impl DareStore for SqliteStore {
  type Error = Error;

  // ── Users ──────────────────────────────────────────────────────────────────

  async fn find_or_create_user(&self, wallet: String) -> Result<(User, bool)> {
    self.run(move |c| users::find_or_create(c, &wallet)).await
  }

  async fn get_user(&self, wallet: String) -> Result<Option<User>> {
    self.run(move |c| users::get(c, &wallet)).await
  }

  async fn update_profile(&self, wallet: String, update: ProfileUpdate) -> Result<User> {
    self.run(move |c| users::update_profile(c, &wallet, update)).await
  }

  async fn profile_stats(&self, wallet: String) -> Result<ProfileStats> {
    self.run(move |c| users::profile_stats(c, &wallet)).await
  }

  async fn delete_user(&self, wallet: String) -> Result<()> {
    self.run(move |c| users::delete_user(c, &wallet)).await
  }

  // ── Dares ──────────────────────────────────────────────────────────────────

  async fn create_dare(&self, input: NewDare) -> Result<Dare> {
    self.run(move |c| dares::create(c, input)).await
  }

  async fn get_dare(&self, id: i64) -> Result<Option<Dare>> {
    self.run(move |c| sql::load_dare(c, id)).await
  }

  async fn list_dares(
    &self,
    viewer: Option<String>,
    status: Option<DareStatus>,
  ) -> Result<Vec<DareListing>> {
    self.run(move |c| dares::list(c, viewer.as_deref(), status)).await
  }

  async fn accept_dare(&self, wallet: String, dare_id: i64) -> Result<UserDare> {
    self.run(move |c| dares::accept(c, &wallet, dare_id)).await
  }

  async fn toggle_dare_like(&self, wallet: String, dare_id: i64) -> Result<LikeToggle> {
    self.run(move |c| social::toggle_dare_like(c, &wallet, dare_id)).await
  }

  async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepReport> {
    self.run(move |c| dares::sweep(c, now)).await
  }

  // ── Comments ───────────────────────────────────────────────────────────────

  async fn add_comment(
    &self,
    wallet: String,
    dare_id: i64,
    text: String,
    replying_to: Option<i64>,
  ) -> Result<Comment> {
    self
      .run(move |c| social::add_comment(c, &wallet, dare_id, &text, replying_to))
      .await
  }

  async fn list_comments(&self, dare_id: i64, viewer: Option<String>) -> Result<Vec<CommentView>> {
    self.run(move |c| social::list_comments(c, dare_id, viewer.as_deref())).await
  }

  async fn toggle_comment_like(&self, wallet: String, comment_id: i64) -> Result<LikeToggle> {
    self.run(move |c| social::toggle_comment_like(c, &wallet, comment_id)).await
  }

  // ── Submissions and voting ─────────────────────────────────────────────────

  async fn submit_proof(&self, input: NewSubmission) -> Result<Submission> {
    self.run(move |c| voting::submit_proof(c, input)).await
  }

  async fn get_submission(&self, dare_id: i64, wallet: String) -> Result<Option<Submission>> {
    self.run(move |c| voting::get_submission(c, dare_id, &wallet)).await
  }

  async fn cast_vote(&self, wallet: String, submission_id: i64, choice: VoteChoice) -> Result<Vote> {
    self.run(move |c| voting::cast_vote(c, &wallet, submission_id, choice)).await
  }

  async fn voting_summary(&self, dare_id: i64) -> Result<Option<VotingSummary>> {
    self.run(move |c| voting::voting_summary(c, dare_id)).await
  }

  async fn finalize_dare(
    &self,
    wallet: String,
    dare_id: i64,
    submission_id: Option<i64>,
  ) -> Result<Finalization> {
    self.run(move |c| voting::finalize(c, &wallet, dare_id, submission_id)).await
  }

  // ── Aggregates ─────────────────────────────────────────────────────────────

  async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
    self.run(move |c| users::leaderboard(c, limit)).await
  }

  async fn achievements(&self, wallet: String) -> Result<Vec<Achievement>> {
    self.run(move |c| users::achievements(c, &wallet)).await
  }

  async fn user_activities(&self, wallet: String, limit: usize) -> Result<Vec<Activity>> {
    self.run(move |c| users::activities(c, &wallet, limit)).await
  }

  // ── Notifications ──────────────────────────────────────────────────────────

  async fn list_notifications(&self, wallet: String, unread_only: bool) -> Result<Vec<Notification>> {
    self.run(move |c| notifications::list(c, &wallet, unread_only)).await
  }

  async fn mark_notification_read(&self, wallet: String, id: i64) -> Result<()> {
    self.run(move |c| notifications::mark_read(c, &wallet, id)).await
  }

  async fn mark_all_read(&self, wallet: String) -> Result<usize> {
    self.run(move |c| notifications::mark_all_read(c, &wallet)).await
  }

  async fn notification_settings(&self, wallet: String) -> Result<NotificationSettings> {
    self.run(move |c| notifications::settings(c, &wallet)).await
  }

  async fn update_notification_settings(
    &self,
    wallet: String,
    settings: NotificationSettings,
  ) -> Result<NotificationSettings> {
    self
      .run(move |c| notifications::update_settings(c, &wallet, settings))
      .await
  }

  // ── Chain projection ───────────────────────────────────────────────────────

  async fn sync_onchain(&self, snapshots: Vec<OnChainDare>) -> Result<SyncReport> {
    self.run(move |c| sync::sync(c, &snapshots)).await
  }
}
