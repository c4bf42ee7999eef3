//! Users, profiles, account deletion, and the leaderboard aggregates.

use chrono::Utc;
use darex_core::{
  achievement::{self, Achievement},
  activity::{self, Activity, ActivityKind},
  leaderboard::{LeaderboardEntry, competition_ranks},
  user::{ProfileStats, ProfileUpdate, User},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use super::user_id;
use crate::{
  Error, Result,
  encode::{RawUser, USER_SELECT, decode_dt, decode_enum, encode_dt},
};

pub fn load_user(conn: &Connection, wallet: &str) -> Result<Option<User>> {
  let raw = conn
    .query_row(
      &format!("{USER_SELECT} WHERE u.walletAddress = ?1"),
      params![wallet],
      RawUser::from_row,
    )
    .optional()?;
  raw.map(RawUser::into_user).transpose()
}

fn require_user(conn: &Connection, wallet: &str) -> Result<User> {
  load_user(conn, wallet)?.ok_or_else(|| Error::UserNotFound(wallet.to_owned()))
}

/// Insert the user row for `wallet` if missing. Returns `true` if inserted.
pub fn ensure_user(conn: &Connection, wallet: &str) -> Result<bool> {
  let inserted = conn.execute(
    "INSERT OR IGNORE INTO users (walletAddress, createdAt) VALUES (?1, ?2)",
    params![wallet, encode_dt(Utc::now())],
  )?;
  Ok(inserted == 1)
}

pub fn find_or_create(conn: &mut Connection, wallet: &str) -> Result<(User, bool)> {
  let tx = conn.transaction()?;
  let created = ensure_user(&tx, wallet)?;
  let user = require_user(&tx, wallet)?;
  tx.commit()?;
  Ok((user, created))
}

pub fn get(conn: &Connection, wallet: &str) -> Result<Option<User>> { load_user(conn, wallet) }

pub fn update_profile(conn: &Connection, wallet: &str, update: ProfileUpdate) -> Result<User> {
  let changed = conn.execute(
    "UPDATE users SET
       username = COALESCE(?2, username),
       bio      = COALESCE(?3, bio),
       avatar   = COALESCE(?4, avatar)
     WHERE walletAddress = ?1",
    params![wallet, update.username, update.bio, update.avatar],
  )?;
  if changed == 0 {
    return Err(Error::UserNotFound(wallet.to_owned()));
  }
  require_user(conn, wallet)
}

fn votes_cast(conn: &Connection, user_id: i64) -> Result<i64> {
  Ok(conn.query_row(
    "SELECT COUNT(*) FROM votes WHERE userId = ?1",
    params![user_id],
    |r| r.get(0),
  )?)
}

pub fn profile_stats(conn: &Connection, wallet: &str) -> Result<ProfileStats> {
  let user = require_user(conn, wallet)?;
  let total_users = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
  let votes_cast = votes_cast(conn, user.id)?;
  Ok(ProfileStats { user, total_users, votes_cast })
}

pub fn achievements(conn: &Connection, wallet: &str) -> Result<Vec<Achievement>> {
  let user = require_user(conn, wallet)?;
  let votes = votes_cast(conn, user.id)?;
  Ok(achievement::evaluate(&user, votes))
}

pub fn leaderboard(conn: &Connection, limit: usize) -> Result<Vec<LeaderboardEntry>> {
  let limit = i64::try_from(limit).unwrap_or(i64::MAX);
  let mut stmt = conn.prepare(
    "SELECT id, walletAddress, username, avatar, daresCompleted, daresCreated,
            totalEarned, currentStreak
     FROM users
     ORDER BY daresCompleted DESC, id ASC
     LIMIT ?1",
  )?;
  let mut entries = stmt
    .query_map(params![limit], |r| {
      Ok(LeaderboardEntry {
        rank:            0,
        user_id:         r.get(0)?,
        wallet_address:  r.get(1)?,
        username:        r.get(2)?,
        avatar:          r.get(3)?,
        dares_completed: r.get(4)?,
        dares_created:   r.get(5)?,
        total_earned:    r.get(6)?,
        current_streak:  r.get(7)?,
        change:          0,
        badges:          Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  // Rows are sorted by score, so every user ranked above a returned row is
  // itself in the page; ranking the page alone gives global ranks.
  let scores: Vec<i64> = entries.iter().map(|e| e.dares_completed).collect();
  for (entry, rank) in entries.iter_mut().zip(competition_ranks(&scores)) {
    entry.rank = rank;
  }
  Ok(entries)
}

/// Delete the user for `wallet` and every row keyed by them, then recompute
/// the cached counters of the dares and comments they touched.
pub fn delete_user(conn: &mut Connection, wallet: &str) -> Result<()> {
  let tx = conn.transaction()?;
  let uid = user_id(&tx, wallet)?;

  // Remember which counters will go stale before the rows disappear.
  let touched_dares: Vec<i64> = {
    let mut stmt = tx.prepare(
      "SELECT dareId FROM user_dares WHERE userId = ?1
       UNION SELECT dareId FROM dare_likes WHERE userId = ?1
       UNION SELECT dareId FROM dare_comments WHERE userId = ?1",
    )?;
    stmt
      .query_map(params![uid], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  let touched_comments: Vec<i64> = {
    let mut stmt = tx.prepare(
      "SELECT commentId FROM dare_comment_likes WHERE userId = ?1",
    )?;
    stmt
      .query_map(params![uid], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let own_comments = "SELECT id FROM dare_comments WHERE userId = ?1";
  let own_submissions = "SELECT id FROM submissions WHERE userId = ?1";
  let statements = [
    format!("DELETE FROM votes WHERE userId = ?1 OR submissionId IN ({own_submissions})"),
    "DELETE FROM submissions WHERE userId = ?1".to_owned(),
    "DELETE FROM user_dares WHERE userId = ?1".to_owned(),
    "DELETE FROM dare_likes WHERE userId = ?1".to_owned(),
    format!("DELETE FROM dare_comment_likes WHERE userId = ?1 OR commentId IN ({own_comments})"),
    // Replies by other users survive as top-level comments.
    format!("UPDATE dare_comments SET replyingTo = NULL WHERE replyingTo IN ({own_comments})"),
    "DELETE FROM dare_comments WHERE userId = ?1".to_owned(),
    "DELETE FROM notifications WHERE userId = ?1".to_owned(),
    "DELETE FROM user_notification_settings WHERE userId = ?1".to_owned(),
    "DELETE FROM users WHERE id = ?1".to_owned(),
  ];
  for sql in &statements {
    tx.execute(sql, params![uid])?;
  }

  for dare_id in touched_dares {
    tx.execute(
      "UPDATE dares SET
         participants = (SELECT COUNT(*) FROM user_dares    WHERE dareId = ?1),
         likes        = (SELECT COUNT(*) FROM dare_likes    WHERE dareId = ?1),
         comments     = (SELECT COUNT(*) FROM dare_comments WHERE dareId = ?1)
       WHERE id = ?1",
      params![dare_id],
    )?;
  }
  for comment_id in touched_comments {
    tx.execute(
      "UPDATE dare_comments SET
         likes = (SELECT COUNT(*) FROM dare_comment_likes WHERE commentId = ?1)
       WHERE id = ?1",
      params![comment_id],
    )?;
  }

  tx.commit()?;
  Ok(())
}

/// The activity feed for `wallet`, assembled from the dares they created,
/// accepted, submitted to, voted on, and won.
pub fn activities(conn: &Connection, wallet: &str, limit: usize) -> Result<Vec<Activity>> {
  let uid = user_id(conn, wallet)?;
  let mut stmt = conn.prepare(
    "SELECT 'created', d.id, d.id, d.title, d.reward, NULL, d.createdAt
       FROM dares d WHERE d.creator = ?1
     UNION ALL
     SELECT 'accepted', ud.id, d.id, d.title, d.reward, NULL, ud.acceptedAt
       FROM user_dares ud JOIN dares d ON d.id = ud.dareId WHERE ud.userId = ?2
     UNION ALL
     SELECT 'submitted', s.id, d.id, d.title, d.reward, NULL, s.createdAt
       FROM submissions s JOIN dares d ON d.id = s.dareId WHERE s.userId = ?2
     UNION ALL
     SELECT 'voted', v.id, d.id, d.title, d.reward, v.vote, v.createdAt
       FROM votes v
       JOIN submissions s ON s.id = v.submissionId
       JOIN dares d ON d.id = s.dareId
      WHERE v.userId = ?2
     UNION ALL
     SELECT 'completed', d.id, d.id, d.title, d.reward, NULL, d.completedAt
       FROM dares d
      WHERE d.winner = ?1 AND d.status = 'completed' AND d.completedAt IS NOT NULL",
  )?;
  let rows = stmt
    .query_map(params![wallet, uid], |r| {
      Ok((
        r.get::<_, String>(0)?,
        r.get::<_, i64>(1)?,
        r.get::<_, i64>(2)?,
        r.get::<_, String>(3)?,
        r.get::<_, f64>(4)?,
        r.get::<_, Option<String>>(5)?,
        r.get::<_, String>(6)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let feed = rows
    .into_iter()
    .map(|(kind, row_id, dare_id, title, reward, detail, at)| {
      Ok(Activity::new(
        decode_enum::<ActivityKind>(&kind, "activity kind")?,
        row_id,
        dare_id,
        title,
        reward,
        detail.as_deref(),
        decode_dt(&at)?,
      ))
    })
    .collect::<Result<Vec<_>>>()?;
  Ok(activity::newest_first(feed, limit))
}
