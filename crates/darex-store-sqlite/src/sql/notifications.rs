use darex_core::notification::{Notification, NotificationSettings};
use rusqlite::{Connection, params};

use super::{settings_for, user_id};
use crate::{
  Error, Result,
  encode::{NOTIFICATION_COLUMNS, RawNotification},
};

pub fn list(conn: &Connection, wallet: &str, unread_only: bool) -> Result<Vec<Notification>> {
  let uid = user_id(conn, wallet)?;
  let filter = if unread_only { "AND isRead = 0" } else { "" };
  let mut stmt = conn.prepare(&format!(
    "SELECT {NOTIFICATION_COLUMNS} FROM notifications
     WHERE userId = ?1 {filter}
     ORDER BY createdAt DESC, id DESC"
  ))?;
  let raws = stmt
    .query_map(params![uid], RawNotification::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawNotification::into_notification).collect()
}

/// Mark one of `wallet`'s notifications read. Someone else's notification is
/// reported as not found.
pub fn mark_read(conn: &Connection, wallet: &str, id: i64) -> Result<()> {
  let uid = user_id(conn, wallet)?;
  let changed = conn.execute(
    "UPDATE notifications SET isRead = 1 WHERE id = ?1 AND userId = ?2",
    params![id, uid],
  )?;
  if changed == 0 {
    return Err(Error::NotificationNotFound(id));
  }
  Ok(())
}

pub fn mark_all_read(conn: &Connection, wallet: &str) -> Result<usize> {
  let uid = user_id(conn, wallet)?;
  Ok(conn.execute(
    "UPDATE notifications SET isRead = 1 WHERE userId = ?1 AND isRead = 0",
    params![uid],
  )?)
}

pub fn settings(conn: &Connection, wallet: &str) -> Result<NotificationSettings> {
  let uid = user_id(conn, wallet)?;
  settings_for(conn, uid)
}

pub fn update_settings(
  conn: &Connection,
  wallet: &str,
  settings: NotificationSettings,
) -> Result<NotificationSettings> {
  let uid = user_id(conn, wallet)?;
  conn.execute(
    "INSERT INTO user_notification_settings (userId, dareUpdates, comments, submissionStatus)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(userId) DO UPDATE SET
       dareUpdates      = excluded.dareUpdates,
       comments         = excluded.comments,
       submissionStatus = excluded.submissionStatus",
    params![uid, settings.dare_updates, settings.comments, settings.submission_status],
  )?;
  settings_for(conn, uid)
}
