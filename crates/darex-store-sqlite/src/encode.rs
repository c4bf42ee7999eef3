//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microsecond precision in
//! UTC. Enums are stored as their `strum` text form. Each `Raw*` struct
//! mirrors a `SELECT` column list and is converted to the domain type outside
//! of the row-mapping closure, where decoding failures can carry our own
//! error type.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use darex_core::{
  dare::{Dare, DareStatus},
  deadline::Deadline,
  notification::{Notification, NotificationKind},
  social::Comment,
  submission::{Submission, SubmissionStatus},
  user::User,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_enum<T: FromStr>(s: &str, what: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

fn decode_chain_id(id: Option<i64>) -> Result<Option<u64>> {
  id.map(|v| u64::try_from(v).map_err(|_| Error::Decode(format!("negative chainDareId {v}"))))
    .transpose()
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// Column list for [`RawUser::from_row`]. `rank` is derived, never stored.
pub const USER_SELECT: &str = "
  SELECT u.id, u.walletAddress, u.username, u.bio, u.avatar,
         u.daresCompleted, u.daresCreated, u.totalEarned, u.votingAccuracy,
         u.currentStreak, u.longestStreak,
         1 + (SELECT COUNT(*) FROM users o WHERE o.daresCompleted > u.daresCompleted),
         u.createdAt
  FROM users u";

pub struct RawUser {
  pub id:              i64,
  pub wallet_address:  String,
  pub username:        Option<String>,
  pub bio:             Option<String>,
  pub avatar:          Option<String>,
  pub dares_completed: i64,
  pub dares_created:   i64,
  pub total_earned:    f64,
  pub voting_accuracy: i64,
  pub current_streak:  i64,
  pub longest_streak:  i64,
  pub rank:            i64,
  pub created_at:      String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      wallet_address:  row.get(1)?,
      username:        row.get(2)?,
      bio:             row.get(3)?,
      avatar:          row.get(4)?,
      dares_completed: row.get(5)?,
      dares_created:   row.get(6)?,
      total_earned:    row.get(7)?,
      voting_accuracy: row.get(8)?,
      current_streak:  row.get(9)?,
      longest_streak:  row.get(10)?,
      rank:            row.get(11)?,
      created_at:      row.get(12)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:              self.id,
      wallet_address:  self.wallet_address,
      username:        self.username,
      bio:             self.bio,
      avatar:          self.avatar,
      dares_completed: self.dares_completed,
      dares_created:   self.dares_created,
      total_earned:    self.total_earned,
      voting_accuracy: self.voting_accuracy,
      current_streak:  self.current_streak,
      longest_streak:  self.longest_streak,
      rank:            self.rank,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

// ─── Dares ────────────────────────────────────────────────────────────────────

/// Column list for [`RawDare::from_row`], over a `dares d` alias.
pub const DARE_COLUMNS: &str = "
  d.id, d.title, d.description, d.reward, d.creator, d.deadline,
  d.difficulty, d.category, d.location, d.featured, d.status,
  d.participants, d.likes, d.comments, d.createdAt,
  d.chainDareId, d.winner, d.rewardClaimed";

/// Number of columns in [`DARE_COLUMNS`]; extra selected columns start here.
pub const DARE_COLUMN_COUNT: usize = 18;

pub struct RawDare {
  pub id:             i64,
  pub title:          String,
  pub description:    String,
  pub reward:         f64,
  pub creator:        String,
  pub deadline:       String,
  pub difficulty:     Option<String>,
  pub category:       Option<String>,
  pub location:       Option<String>,
  pub featured:       bool,
  pub status:         String,
  pub participants:   i64,
  pub likes:          i64,
  pub comments:       i64,
  pub created_at:     String,
  pub chain_dare_id:  Option<i64>,
  pub winner:         Option<String>,
  pub reward_claimed: bool,
}

impl RawDare {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      title:          row.get(1)?,
      description:    row.get(2)?,
      reward:         row.get(3)?,
      creator:        row.get(4)?,
      deadline:       row.get(5)?,
      difficulty:     row.get(6)?,
      category:       row.get(7)?,
      location:       row.get(8)?,
      featured:       row.get(9)?,
      status:         row.get(10)?,
      participants:   row.get(11)?,
      likes:          row.get(12)?,
      comments:       row.get(13)?,
      created_at:     row.get(14)?,
      chain_dare_id:  row.get(15)?,
      winner:         row.get(16)?,
      reward_claimed: row.get(17)?,
    })
  }

  pub fn into_dare(self) -> Result<Dare> {
    Ok(Dare {
      id:             self.id,
      title:          self.title,
      description:    self.description,
      reward:         self.reward,
      creator:        self.creator,
      deadline:       Deadline::from_stored(self.deadline),
      difficulty:     self.difficulty,
      category:       self.category,
      location:       self.location,
      featured:       self.featured,
      status:         decode_enum::<DareStatus>(&self.status, "dare status")?,
      participants:   self.participants,
      likes:          self.likes,
      comments:       self.comments,
      created_at:     decode_dt(&self.created_at)?,
      chain_dare_id:  decode_chain_id(self.chain_dare_id)?,
      winner:         self.winner,
      reward_claimed: self.reward_claimed,
    })
  }
}

// ─── Submissions ──────────────────────────────────────────────────────────────

/// Column list for [`RawSubmission::from_row`], over a `submissions s` alias.
pub const SUBMISSION_COLUMNS: &str =
  "s.id, s.dareId, s.userId, s.description, s.fileCID, s.status, s.createdAt";

pub struct RawSubmission {
  pub id:          i64,
  pub dare_id:     i64,
  pub user_id:     i64,
  pub description: String,
  pub file_cid:    String,
  pub status:      String,
  pub created_at:  String,
}

impl RawSubmission {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      dare_id:     row.get(1)?,
      user_id:     row.get(2)?,
      description: row.get(3)?,
      file_cid:    row.get(4)?,
      status:      row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      id:          self.id,
      dare_id:     self.dare_id,
      user_id:     self.user_id,
      description: self.description,
      file_cid:    self.file_cid,
      status:      decode_enum::<SubmissionStatus>(&self.status, "submission status")?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Comments ─────────────────────────────────────────────────────────────────

/// Column list for [`RawComment::from_row`], over a `dare_comments c` alias.
pub const COMMENT_COLUMNS: &str =
  "c.id, c.dareId, c.userId, c.comment, c.replyingTo, c.likes, c.createdAt";

pub struct RawComment {
  pub id:          i64,
  pub dare_id:     i64,
  pub user_id:     i64,
  pub comment:     String,
  pub replying_to: Option<i64>,
  pub likes:       i64,
  pub created_at:  String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      dare_id:     row.get(1)?,
      user_id:     row.get(2)?,
      comment:     row.get(3)?,
      replying_to: row.get(4)?,
      likes:       row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:          self.id,
      dare_id:     self.dare_id,
      user_id:     self.user_id,
      comment:     self.comment,
      replying_to: self.replying_to,
      likes:       self.likes,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── Notifications ────────────────────────────────────────────────────────────

pub const NOTIFICATION_COLUMNS: &str = "id, userId, type, message, isRead, createdAt";

pub struct RawNotification {
  pub id:         i64,
  pub user_id:    i64,
  pub kind:       String,
  pub message:    String,
  pub is_read:    bool,
  pub created_at: String,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      user_id:    row.get(1)?,
      kind:       row.get(2)?,
      message:    row.get(3)?,
      is_read:    row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      id:         self.id,
      user_id:    self.user_id,
      kind:       decode_enum::<NotificationKind>(&self.kind, "notification type")?,
      message:    self.message,
      is_read:    self.is_read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
