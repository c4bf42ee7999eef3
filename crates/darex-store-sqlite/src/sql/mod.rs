//! Synchronous query functions run on the connection thread.
//!
//! Every function here receives the raw connection (or an open transaction)
//! and returns our own [`Result`], so domain failures such as "already
//! accepted" travel back through `tokio_rusqlite` untouched.

pub mod dares;
pub mod notifications;
pub mod social;
pub mod sync;
pub mod users;
pub mod voting;

use chrono::Utc;
use darex_core::{
  dare::{Dare, DareStatus},
  notification::{NotificationKind, NotificationSettings},
};
use rusqlite::{Connection, ErrorCode, OptionalExtension as _, params};

use crate::{
  Error, Result,
  encode::{DARE_COLUMNS, RawDare, encode_dt},
};

/// Whether `err` is a UNIQUE (or other constraint) violation.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
  )
}

/// Resolve a wallet address to a user id.
pub fn user_id(conn: &Connection, wallet: &str) -> Result<i64> {
  conn
    .query_row(
      "SELECT id FROM users WHERE walletAddress = ?1",
      params![wallet],
      |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::UserNotFound(wallet.to_owned()))
}

/// Like [`user_id`] but `None` for unknown wallets.
pub fn maybe_user_id(conn: &Connection, wallet: &str) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM users WHERE walletAddress = ?1",
        params![wallet],
        |r| r.get(0),
      )
      .optional()?,
  )
}

pub fn load_dare(conn: &Connection, id: i64) -> Result<Option<Dare>> {
  let raw = conn
    .query_row(
      &format!("SELECT {DARE_COLUMNS} FROM dares d WHERE d.id = ?1"),
      params![id],
      RawDare::from_row,
    )
    .optional()?;
  raw.map(RawDare::into_dare).transpose()
}

pub fn require_dare(conn: &Connection, id: i64) -> Result<Dare> {
  load_dare(conn, id)?.ok_or(Error::DareNotFound(id))
}

pub fn require_status(dare: &Dare, expected: DareStatus) -> Result<()> {
  if dare.status == expected {
    Ok(())
  } else {
    Err(Error::WrongStatus { dare_id: dare.id, expected, actual: dare.status })
  }
}

pub fn settings_for(conn: &Connection, user_id: i64) -> Result<NotificationSettings> {
  let stored = conn
    .query_row(
      "SELECT dareUpdates, comments, submissionStatus
       FROM user_notification_settings WHERE userId = ?1",
      params![user_id],
      |r| {
        Ok(NotificationSettings {
          dare_updates:      r.get(0)?,
          comments:          r.get(1)?,
          submission_status: r.get(2)?,
        })
      },
    )
    .optional()?;
  Ok(stored.unwrap_or_default())
}

/// Insert a notification for `user_id` unless their settings turn this kind
/// off. Returns whether a row was written.
pub fn notify(
  conn: &Connection,
  user_id: i64,
  kind: NotificationKind,
  message: &str,
) -> Result<bool> {
  if !kind.enabled_by(&settings_for(conn, user_id)?) {
    return Ok(false);
  }
  conn.execute(
    "INSERT INTO notifications (userId, type, message, isRead, createdAt)
     VALUES (?1, ?2, ?3, 0, ?4)",
    params![user_id, kind.to_string(), message, encode_dt(Utc::now())],
  )?;
  Ok(true)
}

/// Notify whoever owns `wallet`, if that wallet belongs to a known user.
pub fn notify_wallet(
  conn: &Connection,
  wallet: &str,
  kind: NotificationKind,
  message: &str,
) -> Result<bool> {
  match maybe_user_id(conn, wallet)? {
    Some(id) => notify(conn, id, kind, message),
    None => Ok(false),
  }
}
