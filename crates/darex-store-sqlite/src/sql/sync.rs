//! Reconciling the relational projection with escrow contract state.
//!
//! The chain owns reward, completion, winner, and claim state. Rows are
//! matched on `chainDareId`; status still only moves forward. When the chain
//! names a different winner for a dare already completed here, the previous
//! winner's approval and credit are reversed before the chain winner is
//! settled.

use chrono::{DateTime, Utc};
use darex_core::{
  dare::DareStatus,
  deadline::Deadline,
  escrow::{OnChainDare, wei_to_units},
  store::SyncReport,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use super::{maybe_user_id, users::ensure_user, voting::credit_winner};
use crate::{
  Error, Result,
  encode::{decode_enum, encode_dt},
};

struct Projected {
  id:             i64,
  reward:         f64,
  status:         DareStatus,
  winner:         Option<String>,
  reward_claimed: bool,
}

fn find_projection(conn: &Connection, chain_id: i64) -> Result<Option<Projected>> {
  let row = conn
    .query_row(
      "SELECT id, reward, status, winner, rewardClaimed FROM dares WHERE chainDareId = ?1",
      params![chain_id],
      |r| {
        Ok((
          r.get::<_, i64>(0)?,
          r.get::<_, f64>(1)?,
          r.get::<_, String>(2)?,
          r.get::<_, Option<String>>(3)?,
          r.get::<_, bool>(4)?,
        ))
      },
    )
    .optional()?;
  row
    .map(|(id, reward, status, winner, reward_claimed)| {
      Ok(Projected {
        id,
        reward,
        status: decode_enum(&status, "dare status")?,
        winner,
        reward_claimed,
      })
    })
    .transpose()
}

fn insert_projection(conn: &Connection, chain_id: i64, snap: &OnChainDare) -> Result<()> {
  let deadline = DateTime::<Utc>::from_timestamp(snap.deadline, 0)
    .map(Deadline::At)
    .ok_or_else(|| Error::Invalid(format!("deadline {} out of range", snap.deadline)))?;
  let status = if snap.completed { DareStatus::Completed } else { DareStatus::Open };
  let now = encode_dt(Utc::now());
  let completed_at = snap.completed.then(|| now.clone());

  ensure_user(conn, &snap.creator)?;
  conn.execute(
    "UPDATE users SET daresCreated = daresCreated + 1 WHERE walletAddress = ?1",
    params![snap.creator],
  )?;
  conn.execute(
    "INSERT INTO dares (
       title, description, reward, creator, deadline, status, createdAt,
       chainDareId, winner, rewardClaimed, completedAt
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    params![
      snap.title,
      snap.description,
      wei_to_units(snap.reward),
      snap.creator,
      deadline.to_string(),
      status.to_string(),
      now,
      chain_id,
      snap.winner,
      snap.reward_claimed,
      completed_at,
    ],
  )?;
  Ok(())
}

/// Approve the winner's latest submission on `dare_id` and credit them, if
/// the winner is a known user who submitted.
fn settle_winner(conn: &Connection, dare_id: i64, winner: &str, reward: f64) -> Result<()> {
  let Some(uid) = maybe_user_id(conn, winner)? else {
    return Ok(());
  };
  let submission: Option<i64> = conn
    .query_row(
      "SELECT id FROM submissions WHERE dareId = ?1 AND userId = ?2
       ORDER BY createdAt DESC, id DESC LIMIT 1",
      params![dare_id, uid],
      |r| r.get(0),
    )
    .optional()?;
  if let Some(id) = submission {
    conn.execute("UPDATE submissions SET status = 'approved' WHERE id = ?1", params![id])?;
    credit_winner(conn, uid, reward)?;
  }
  Ok(())
}

/// Undo [`settle_winner`] for a winner the chain no longer recognises:
/// reject their approved submission and take back the completion, the
/// reward, and one step of streak.
fn revoke_winner(conn: &Connection, dare_id: i64, winner: &str, reward: f64) -> Result<()> {
  let Some(uid) = maybe_user_id(conn, winner)? else {
    return Ok(());
  };
  let revoked = conn.execute(
    "UPDATE submissions SET status = 'rejected'
     WHERE dareId = ?1 AND userId = ?2 AND status = 'approved'",
    params![dare_id, uid],
  )?;
  if revoked > 0 {
    conn.execute(
      "UPDATE users SET
         daresCompleted = MAX(daresCompleted - 1, 0),
         totalEarned    = MAX(totalEarned - ?2, 0),
         currentStreak  = MAX(currentStreak - 1, 0)
       WHERE id = ?1",
      params![uid, reward],
    )?;
  }
  Ok(())
}

pub fn sync(conn: &mut Connection, snapshots: &[OnChainDare]) -> Result<SyncReport> {
  let tx = conn.transaction()?;
  let mut report = SyncReport::default();

  for snap in snapshots {
    let chain_id = i64::try_from(snap.id)
      .map_err(|_| Error::Invalid(format!("chain dare id {} out of range", snap.id)))?;

    let Some(current) = find_projection(&tx, chain_id)? else {
      insert_projection(&tx, chain_id, snap)?;
      report.inserted += 1;
      continue;
    };

    let reward = wei_to_units(snap.reward);
    let status = if snap.completed {
      current.status.advance_to(DareStatus::Completed)?
    } else {
      current.status
    };
    let winner = snap.winner.clone().or_else(|| current.winner.clone());

    if reward == current.reward
      && status == current.status
      && winner == current.winner
      && snap.reward_claimed == current.reward_claimed
    {
      report.unchanged += 1;
      continue;
    }

    tx.execute(
      "UPDATE dares SET
         reward = ?2, status = ?3, winner = ?4, rewardClaimed = ?5,
         completedAt = CASE WHEN ?3 = 'completed' THEN COALESCE(completedAt, ?6) END
       WHERE id = ?1",
      params![
        current.id,
        reward,
        status.to_string(),
        winner,
        snap.reward_claimed,
        encode_dt(Utc::now()),
      ],
    )?;

    let was_completed = current.status == DareStatus::Completed;
    let winner_changed = winner != current.winner;
    if status == DareStatus::Completed && (!was_completed || winner_changed) {
      if let (true, Some(previous)) = (was_completed, current.winner.as_deref()) {
        revoke_winner(&tx, current.id, previous, current.reward)?;
      }
      if let Some(winner) = winner.as_deref() {
        settle_winner(&tx, current.id, winner, reward)?;
      }
    }
    report.updated += 1;
  }

  tx.commit()?;
  Ok(report)
}
