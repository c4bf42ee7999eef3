//! Proof submissions, community votes, and dare finalization.

use chrono::Utc;
use darex_core::{
  dare::DareStatus,
  notification::NotificationKind,
  submission::{
    Finalization, NewSubmission, Submission, SubmissionStatus, Tally, TalliedSubmission, Vote,
    VoteChoice, VotingSummary, pick_winner,
  },
};
use rusqlite::{Connection, OptionalExtension as _, params};

use super::{
  is_constraint_violation, load_dare, maybe_user_id, notify, require_dare, require_status,
  user_id,
};
use crate::{
  Error, Result,
  encode::{RawSubmission, SUBMISSION_COLUMNS, decode_dt, encode_dt},
};

fn load_submission(conn: &Connection, id: i64) -> Result<Option<Submission>> {
  let raw = conn
    .query_row(
      &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions s WHERE s.id = ?1"),
      params![id],
      RawSubmission::from_row,
    )
    .optional()?;
  raw.map(RawSubmission::into_submission).transpose()
}

pub fn submit_proof(conn: &Connection, input: NewSubmission) -> Result<Submission> {
  let required = [
    ("walletAddress", &input.wallet_address),
    ("description", &input.description),
    ("fileCID", &input.file_cid),
  ];
  for (field, value) in required {
    if value.trim().is_empty() {
      return Err(Error::Invalid(format!("{field} is required")));
    }
  }

  let uid = user_id(conn, &input.wallet_address)?;
  let dare = require_dare(conn, input.dare_id)?;
  if dare.creator == input.wallet_address {
    return Err(Error::CreatorCannotParticipate);
  }
  require_status(&dare, DareStatus::Open)?;

  conn.execute(
    "INSERT INTO submissions (dareId, userId, description, fileCID, status, createdAt)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      input.dare_id,
      uid,
      input.description,
      input.file_cid,
      SubmissionStatus::Pending.to_string(),
      encode_dt(Utc::now()),
    ],
  )?;
  let id = conn.last_insert_rowid();
  load_submission(conn, id)?.ok_or(Error::SubmissionNotFound(id))
}

pub fn get_submission(conn: &Connection, dare_id: i64, wallet: &str) -> Result<Option<Submission>> {
  let Some(uid) = maybe_user_id(conn, wallet)? else {
    return Ok(None);
  };
  let raw = conn
    .query_row(
      &format!(
        "SELECT {SUBMISSION_COLUMNS} FROM submissions s
         WHERE s.dareId = ?1 AND s.userId = ?2
         ORDER BY s.createdAt DESC, s.id DESC LIMIT 1"
      ),
      params![dare_id, uid],
      RawSubmission::from_row,
    )
    .optional()?;
  raw.map(RawSubmission::into_submission).transpose()
}

pub fn cast_vote(
  conn: &mut Connection,
  wallet: &str,
  submission_id: i64,
  choice: VoteChoice,
) -> Result<Vote> {
  let tx = conn.transaction()?;
  let submission =
    load_submission(&tx, submission_id)?.ok_or(Error::SubmissionNotFound(submission_id))?;
  let uid = user_id(&tx, wallet)?;
  let dare = require_dare(&tx, submission.dare_id)?;
  require_status(&dare, DareStatus::Voting)?;
  if submission.user_id == uid {
    return Err(Error::SelfVote);
  }

  let created_at = Utc::now();
  tx.execute(
    "INSERT INTO votes (submissionId, userId, vote, createdAt) VALUES (?1, ?2, ?3, ?4)",
    params![submission_id, uid, choice.to_string(), encode_dt(created_at)],
  )
  .map_err(|e| if is_constraint_violation(&e) { Error::AlreadyVoted } else { e.into() })?;
  let id = tx.last_insert_rowid();
  tx.commit()?;

  Ok(Vote { id, submission_id, user_id: uid, vote: choice, created_at })
}

/// Every submission on `dare_id` with its submitter and vote counts, oldest
/// first.
fn tallied_submissions(conn: &Connection, dare_id: i64) -> Result<Vec<TalliedSubmission>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {SUBMISSION_COLUMNS}, u.walletAddress,
       (SELECT COUNT(*) FROM votes v WHERE v.submissionId = s.id AND v.vote = 'yes'),
       (SELECT COUNT(*) FROM votes v WHERE v.submissionId = s.id AND v.vote = 'no')
     FROM submissions s
     JOIN users u ON u.id = s.userId
     WHERE s.dareId = ?1
     ORDER BY s.id ASC"
  ))?;
  let rows = stmt
    .query_map(params![dare_id], |r| {
      Ok((
        RawSubmission::from_row(r)?,
        r.get::<_, String>(7)?,
        Tally { yes: r.get(8)?, no: r.get(9)? },
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(raw, wallet_address, votes)| {
      Ok(TalliedSubmission { submission: raw.into_submission()?, wallet_address, votes })
    })
    .collect()
}

pub fn voting_summary(conn: &Connection, dare_id: i64) -> Result<Option<VotingSummary>> {
  let Some(dare) = load_dare(conn, dare_id)? else {
    return Ok(None);
  };
  let submissions = tallied_submissions(conn, dare_id)?;
  let completed_at: Option<String> = conn.query_row(
    "SELECT completedAt FROM dares WHERE id = ?1",
    params![dare_id],
    |r| r.get(0),
  )?;
  let voting_ends = completed_at.as_deref().map(decode_dt).transpose()?;
  Ok(Some(VotingSummary::new(dare, submissions, voting_ends)))
}

/// Credit a completed dare to `user_id`: one more completion, the reward,
/// and a longer streak.
pub fn credit_winner(conn: &Connection, user_id: i64, reward: f64) -> Result<()> {
  conn.execute(
    "UPDATE users SET
       daresCompleted = daresCompleted + 1,
       totalEarned    = totalEarned + ?2,
       currentStreak  = currentStreak + 1,
       longestStreak  = MAX(longestStreak, currentStreak + 1)
     WHERE id = ?1",
    params![user_id, reward],
  )?;
  Ok(())
}

/// Recompute `votingAccuracy` for everyone who voted on `dare_id`, as the
/// share of their votes on decided submissions that matched the outcome.
fn recompute_voting_accuracy(conn: &Connection, dare_id: i64) -> Result<()> {
  conn.execute(
    "UPDATE users SET votingAccuracy = (
       SELECT COALESCE(CAST(ROUND(100.0 * SUM(
           (v.vote = 'yes' AND s.status = 'approved')
           OR (v.vote = 'no' AND s.status = 'rejected')
         ) / COUNT(*)) AS INTEGER), 0)
       FROM votes v JOIN submissions s ON s.id = v.submissionId
       WHERE v.userId = users.id AND s.status IN ('approved', 'rejected')
     )
     WHERE id IN (
       SELECT v.userId FROM votes v JOIN submissions s ON s.id = v.submissionId
       WHERE s.dareId = ?1
     )",
    params![dare_id],
  )?;
  Ok(())
}

pub fn finalize(
  conn: &mut Connection,
  wallet: &str,
  dare_id: i64,
  submission_id: Option<i64>,
) -> Result<Finalization> {
  let tx = conn.transaction()?;
  let dare = require_dare(&tx, dare_id)?;
  if dare.creator != wallet {
    return Err(Error::NotCreator);
  }
  require_status(&dare, DareStatus::Voting)?;
  let status = dare.status.advance_to(DareStatus::Completed)?;

  let tallied = tallied_submissions(&tx, dare_id)?;
  let winner = match submission_id {
    Some(id) => Some(
      tallied
        .iter()
        .find(|t| t.submission.id == id)
        .ok_or(Error::SubmissionNotFound(id))?,
    ),
    None => pick_winner(&tallied),
  };
  let winner_wallet = winner.map(|w| w.wallet_address.clone());
  let winning_submission = winner.map(|w| w.submission.id);
  let winner_user = winner.map(|w| w.submission.user_id);

  tx.execute(
    "UPDATE dares SET status = ?2, winner = ?3, completedAt = ?4 WHERE id = ?1",
    params![dare_id, status.to_string(), winner_wallet, encode_dt(Utc::now())],
  )?;

  for entry in &tallied {
    let sub = &entry.submission;
    let won = Some(sub.id) == winning_submission;
    let (new_status, kind, message) = if won {
      (
        SubmissionStatus::Approved,
        NotificationKind::SubmissionApproved,
        format!("Your submission for \"{}\" won! You earned {}", dare.title, dare.reward),
      )
    } else {
      (
        SubmissionStatus::Rejected,
        NotificationKind::SubmissionRejected,
        format!("Your submission for \"{}\" was not selected", dare.title),
      )
    };
    tx.execute(
      "UPDATE submissions SET status = ?2 WHERE id = ?1",
      params![sub.id, new_status.to_string()],
    )?;
    notify(&tx, sub.user_id, kind, &message)?;
  }

  if let Some(uid) = winner_user {
    credit_winner(&tx, uid, dare.reward)?;
  }
  tx.execute(
    "UPDATE users SET currentStreak = 0
     WHERE id IN (SELECT userId FROM submissions WHERE dareId = ?1)
       AND id IS NOT ?2",
    params![dare_id, winner_user],
  )?;
  recompute_voting_accuracy(&tx, dare_id)?;

  tx.commit()?;
  Ok(Finalization {
    dare_id,
    reward: if winner_wallet.is_some() { dare.reward } else { 0.0 },
    winner: winner_wallet,
    winning_submission,
  })
}
