//! Dare creation, listing, acceptance, and the deadline sweep.

use chrono::{DateTime, Utc};
use darex_core::{
  dare::{Dare, DareListing, DareStatus, NewDare, SweepReport, UserDare},
  deadline::Deadline,
  notification::NotificationKind,
};
use rusqlite::{Connection, Transaction, params};

use super::{
  is_constraint_violation, maybe_user_id, notify_wallet, require_dare, require_status, user_id,
  users::ensure_user,
};
use crate::{
  Error, Result,
  encode::{DARE_COLUMN_COUNT, DARE_COLUMNS, RawDare, decode_dt, encode_dt},
};

/// Status values that count as open. `active` is the legacy label.
const OPEN_STATUSES: &str = "('open', 'active')";

fn validate(input: &NewDare, now: DateTime<Utc>) -> Result<()> {
  let required = [
    ("title", &input.title),
    ("description", &input.description),
    ("creator", &input.creator),
  ];
  for (field, value) in required {
    if value.trim().is_empty() {
      return Err(Error::Invalid(format!("{field} is required")));
    }
  }
  if !(input.reward.is_finite() && input.reward > 0.0) {
    return Err(Error::Invalid("reward must be positive".into()));
  }
  match &input.deadline {
    Deadline::Relative { amount: 0, .. } => {
      Err(Error::Invalid("deadline amount must be at least 1".into()))
    }
    Deadline::At(at) if *at <= now => Err(Error::Invalid("deadline must be in the future".into())),
    Deadline::Unparsed(text) => Err(Error::Invalid(format!("invalid deadline: {text:?}"))),
    _ => Ok(()),
  }
}

pub fn create(conn: &mut Connection, input: NewDare) -> Result<Dare> {
  let now = Utc::now();
  validate(&input, now)?;
  let chain_id = input
    .chain_dare_id
    .map(|id| i64::try_from(id).map_err(|_| Error::Invalid(format!("chainDareId {id} out of range"))))
    .transpose()?;

  let tx = conn.transaction()?;
  ensure_user(&tx, &input.creator)?;
  tx.execute(
    "UPDATE users SET daresCreated = daresCreated + 1 WHERE walletAddress = ?1",
    params![input.creator],
  )?;
  tx.execute(
    "INSERT INTO dares (
       title, description, reward, creator, deadline,
       difficulty, category, location, featured, status,
       createdAt, chainDareId
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      input.title,
      input.description,
      input.reward,
      input.creator,
      input.deadline.to_string(),
      input.difficulty,
      input.category,
      input.location,
      input.featured,
      DareStatus::Open.to_string(),
      encode_dt(now),
      chain_id,
    ],
  )
  .map_err(|e| match input.chain_dare_id {
    Some(id) if is_constraint_violation(&e) => Error::DuplicateChainDare(id),
    _ => e.into(),
  })?;
  let id = tx.last_insert_rowid();
  let dare = require_dare(&tx, id)?;
  tx.commit()?;
  Ok(dare)
}

pub fn list(
  conn: &Connection,
  viewer: Option<&str>,
  status: Option<DareStatus>,
) -> Result<Vec<DareListing>> {
  let viewer_id = match viewer {
    Some(wallet) => maybe_user_id(conn, wallet)?,
    None => None,
  };
  let filter = match status {
    Some(DareStatus::Open) => format!("WHERE d.status IN {OPEN_STATUSES}"),
    Some(other) => format!("WHERE d.status = '{other}'"),
    None => String::new(),
  };
  let sql = format!(
    "SELECT {DARE_COLUMNS},
       EXISTS(SELECT 1 FROM user_dares ud WHERE ud.dareId = d.id AND ud.userId = ?1),
       EXISTS(SELECT 1 FROM dare_likes dl WHERE dl.dareId = d.id AND dl.userId = ?1)
     FROM dares d
     {filter}
     ORDER BY d.createdAt DESC, d.id DESC"
  );

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params![viewer_id], |r| {
      Ok((
        RawDare::from_row(r)?,
        r.get::<_, bool>(DARE_COLUMN_COUNT)?,
        r.get::<_, bool>(DARE_COLUMN_COUNT + 1)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(raw, has_accepted, has_liked)| {
      Ok(DareListing { dare: raw.into_dare()?, has_accepted, has_liked })
    })
    .collect()
}

pub fn accept(conn: &mut Connection, wallet: &str, dare_id: i64) -> Result<UserDare> {
  let tx = conn.transaction()?;
  let uid = user_id(&tx, wallet)?;
  let dare = require_dare(&tx, dare_id)?;
  require_status(&dare, DareStatus::Open)?;
  if dare.creator == wallet {
    return Err(Error::CreatorCannotParticipate);
  }

  let accepted_at = Utc::now();
  tx.execute(
    "INSERT INTO user_dares (userId, dareId, acceptedAt) VALUES (?1, ?2, ?3)",
    params![uid, dare_id, encode_dt(accepted_at)],
  )
  .map_err(|e| if is_constraint_violation(&e) { Error::AlreadyAccepted } else { e.into() })?;
  let id = tx.last_insert_rowid();

  let bumped = tx.execute(
    "UPDATE dares SET participants = participants + 1 WHERE id = ?1",
    params![dare_id],
  )?;
  if bumped == 0 {
    return Err(Error::DareNotFound(dare_id));
  }

  notify_wallet(
    &tx,
    &dare.creator,
    NotificationKind::DareAccepted,
    &format!("{wallet} accepted your dare \"{}\"", dare.title),
  )?;
  tx.commit()?;

  Ok(UserDare { id, user_id: uid, dare_id, accepted_at })
}

struct SweepCandidate {
  id:         i64,
  title:      String,
  creator:    String,
  deadline:   String,
  created_at: String,
}

impl SweepCandidate {
  fn expired(&self, now: DateTime<Utc>) -> Result<bool> {
    let deadline: Deadline = self.deadline.parse()?;
    let created_at = decode_dt(&self.created_at)?;
    Ok(deadline.has_passed(created_at, now))
  }
}

/// Move one expired dare to voting under its own savepoint, so a failure
/// here rolls back only this dare. Returns whether the row changed.
fn advance(tx: &mut Transaction<'_>, candidate: &SweepCandidate) -> Result<bool> {
  let sp = tx.savepoint()?;
  let changed = sp.execute(
    &format!("UPDATE dares SET status = ?2 WHERE id = ?1 AND status IN {OPEN_STATUSES}"),
    params![candidate.id, DareStatus::Voting.to_string()],
  )?;
  if changed == 1 {
    notify_wallet(
      &sp,
      &candidate.creator,
      NotificationKind::VotingStarted,
      &format!("Voting has started for your dare \"{}\"", candidate.title),
    )?;
  }
  sp.commit()?;
  Ok(changed == 1)
}

/// Advance every open dare whose deadline has passed to voting.
///
/// Rows that fail to decode or to update are reported and skipped; every
/// other dare still advances. The status update is guarded on the row still
/// being open, so a dare is never moved backwards.
pub fn sweep(conn: &mut Connection, now: DateTime<Utc>) -> Result<SweepReport> {
  let mut tx = conn.transaction()?;
  let candidates = {
    let mut stmt = tx.prepare(&format!(
      "SELECT id, title, creator, deadline, createdAt FROM dares
       WHERE status IN {OPEN_STATUSES} ORDER BY id"
    ))?;
    stmt
      .query_map([], |r| {
        Ok(SweepCandidate {
          id:         r.get(0)?,
          title:      r.get(1)?,
          creator:    r.get(2)?,
          deadline:   r.get(3)?,
          created_at: r.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let mut report = SweepReport::default();
  for candidate in candidates {
    let outcome = match candidate.expired(now) {
      Ok(true) => advance(&mut tx, &candidate),
      other => other.map(|_| false),
    };
    match outcome {
      Ok(true) => report.advanced.push(candidate.id),
      Ok(false) => {}
      Err(e) => report.failed.push((candidate.id, e.to_string())),
    }
  }
  tx.commit()?;
  Ok(report)
}
