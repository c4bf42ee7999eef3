//! Error type for `darex-store-sqlite`.

use darex_core::{ErrorKind, StoreError, dare::DareStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] darex_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("cannot decode column value: {0}")]
  Decode(String),

  #[error("{0}")]
  Invalid(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("dare not found: {0}")]
  DareNotFound(i64),

  #[error("comment not found: {0}")]
  CommentNotFound(i64),

  #[error("submission not found: {0}")]
  SubmissionNotFound(i64),

  #[error("notification not found: {0}")]
  NotificationNotFound(i64),

  #[error("dare already accepted")]
  AlreadyAccepted,

  #[error("already voted on this submission")]
  AlreadyVoted,

  #[error("chain dare {0} is already linked to another dare")]
  DuplicateChainDare(u64),

  #[error("dare {dare_id} is {actual}, expected {expected}")]
  WrongStatus {
    dare_id:  i64,
    expected: DareStatus,
    actual:   DareStatus,
  },

  #[error("creator cannot participate in their own dare")]
  CreatorCannotParticipate,

  #[error("cannot vote on your own submission")]
  SelfVote,

  #[error("only the dare creator may do this")]
  NotCreator,
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Invalid(_) | Error::CreatorCannotParticipate | Error::SelfVote => ErrorKind::Invalid,
      Error::NotCreator => ErrorKind::Forbidden,
      Error::UserNotFound(_)
      | Error::DareNotFound(_)
      | Error::CommentNotFound(_)
      | Error::SubmissionNotFound(_)
      | Error::NotificationNotFound(_) => ErrorKind::NotFound,
      Error::AlreadyAccepted
      | Error::AlreadyVoted
      | Error::DuplicateChainDare(_)
      | Error::WrongStatus { .. } => ErrorKind::Conflict,
      Error::Core(_)
      | Error::Database(_)
      | Error::Sqlite(_)
      | Error::DateParse(_)
      | Error::Decode(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
