//! Likes and comments.

use chrono::Utc;
use darex_core::{
  notification::NotificationKind,
  social::{Comment, CommentView, LikeToggle},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use super::{maybe_user_id, notify_wallet, require_dare, user_id};
use crate::{
  Error, Result,
  encode::{COMMENT_COLUMNS, RawComment, encode_dt},
};

/// Which kind of thing a like points at. Table and column names come from
/// here, never from caller input.
#[derive(Clone, Copy)]
enum LikeTarget {
  Dare,
  Comment,
}

impl LikeTarget {
  fn like_table(self) -> &'static str {
    match self {
      Self::Dare => "dare_likes",
      Self::Comment => "dare_comment_likes",
    }
  }

  fn key_column(self) -> &'static str {
    match self {
      Self::Dare => "dareId",
      Self::Comment => "commentId",
    }
  }

  fn target_table(self) -> &'static str {
    match self {
      Self::Dare => "dares",
      Self::Comment => "dare_comments",
    }
  }

  fn not_found(self, id: i64) -> Error {
    match self {
      Self::Dare => Error::DareNotFound(id),
      Self::Comment => Error::CommentNotFound(id),
    }
  }
}

/// Flip `wallet`'s like on the target. The like row and the cached counter
/// change in one transaction, so the counter always equals the row count.
fn toggle(
  conn: &mut Connection,
  target: LikeTarget,
  wallet: &str,
  target_id: i64,
) -> Result<LikeToggle> {
  let (likes, key, table) = (target.like_table(), target.key_column(), target.target_table());

  let tx = conn.transaction()?;
  let uid = user_id(&tx, wallet)?;
  let exists: bool = tx
    .query_row(
      &format!("SELECT 1 FROM {table} WHERE id = ?1"),
      params![target_id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if !exists {
    return Err(target.not_found(target_id));
  }

  let removed = tx.execute(
    &format!("DELETE FROM {likes} WHERE userId = ?1 AND {key} = ?2"),
    params![uid, target_id],
  )?;
  let liked = if removed > 0 {
    tx.execute(
      &format!("UPDATE {table} SET likes = likes - 1 WHERE id = ?1 AND likes > 0"),
      params![target_id],
    )?;
    false
  } else {
    tx.execute(
      &format!("INSERT INTO {likes} (userId, {key}) VALUES (?1, ?2)"),
      params![uid, target_id],
    )?;
    tx.execute(
      &format!("UPDATE {table} SET likes = likes + 1 WHERE id = ?1"),
      params![target_id],
    )?;
    true
  };

  let count = tx.query_row(
    &format!("SELECT likes FROM {table} WHERE id = ?1"),
    params![target_id],
    |r| r.get(0),
  )?;
  tx.commit()?;
  Ok(LikeToggle { liked, likes: count })
}

pub fn toggle_dare_like(conn: &mut Connection, wallet: &str, dare_id: i64) -> Result<LikeToggle> {
  toggle(conn, LikeTarget::Dare, wallet, dare_id)
}

pub fn toggle_comment_like(
  conn: &mut Connection,
  wallet: &str,
  comment_id: i64,
) -> Result<LikeToggle> {
  toggle(conn, LikeTarget::Comment, wallet, comment_id)
}

fn load_comment(conn: &Connection, id: i64) -> Result<Option<Comment>> {
  let raw = conn
    .query_row(
      &format!("SELECT {COMMENT_COLUMNS} FROM dare_comments c WHERE c.id = ?1"),
      params![id],
      RawComment::from_row,
    )
    .optional()?;
  raw.map(RawComment::into_comment).transpose()
}

pub fn add_comment(
  conn: &mut Connection,
  wallet: &str,
  dare_id: i64,
  text: &str,
  replying_to: Option<i64>,
) -> Result<Comment> {
  if text.trim().is_empty() {
    return Err(Error::Invalid("comment is required".into()));
  }

  let tx = conn.transaction()?;
  let uid = user_id(&tx, wallet)?;
  let dare = require_dare(&tx, dare_id)?;
  if let Some(parent) = replying_to {
    // A reply must point at a comment on the same dare.
    match load_comment(&tx, parent)? {
      Some(p) if p.dare_id == dare_id => {}
      _ => return Err(Error::CommentNotFound(parent)),
    }
  }

  tx.execute(
    "INSERT INTO dare_comments (dareId, userId, comment, replyingTo, createdAt)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![dare_id, uid, text, replying_to, encode_dt(Utc::now())],
  )?;
  let id = tx.last_insert_rowid();
  tx.execute("UPDATE dares SET comments = comments + 1 WHERE id = ?1", params![dare_id])?;

  if dare.creator != wallet {
    notify_wallet(
      &tx,
      &dare.creator,
      NotificationKind::Comment,
      &format!("{wallet} commented on your dare \"{}\"", dare.title),
    )?;
  }

  let comment = load_comment(&tx, id)?.ok_or(Error::CommentNotFound(id))?;
  tx.commit()?;
  Ok(comment)
}

pub fn list_comments(
  conn: &Connection,
  dare_id: i64,
  viewer: Option<&str>,
) -> Result<Vec<CommentView>> {
  require_dare(conn, dare_id)?;
  let viewer_id = match viewer {
    Some(wallet) => maybe_user_id(conn, wallet)?,
    None => None,
  };

  let mut stmt = conn.prepare(&format!(
    "SELECT {COMMENT_COLUMNS}, u.walletAddress, u.username, pu.walletAddress,
       EXISTS(SELECT 1 FROM dare_comment_likes l WHERE l.commentId = c.id AND l.userId = ?2)
     FROM dare_comments c
     JOIN users u ON u.id = c.userId
     LEFT JOIN dare_comments p ON p.id = c.replyingTo
     LEFT JOIN users pu ON pu.id = p.userId
     WHERE c.dareId = ?1
     ORDER BY c.createdAt ASC, c.id ASC"
  ))?;
  let rows = stmt
    .query_map(params![dare_id, viewer_id], |r| {
      Ok((
        RawComment::from_row(r)?,
        r.get::<_, String>(7)?,
        r.get::<_, Option<String>>(8)?,
        r.get::<_, Option<String>>(9)?,
        r.get::<_, bool>(10)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(raw, wallet_address, username, replying_to_wallet, has_liked)| {
      Ok(CommentView {
        comment: raw.into_comment()?,
        wallet_address,
        username,
        replying_to_wallet,
        has_liked,
      })
    })
    .collect()
}
