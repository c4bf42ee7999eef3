//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use darex_core::{
  ErrorKind, StoreError,
  activity::ActivityKind,
  dare::{DareStatus, NewDare},
  deadline::Deadline,
  escrow::EscrowContract,
  notification::{NotificationKind, NotificationSettings},
  store::{DareStore, SyncReport},
  submission::{NewSubmission, SubmissionStatus, VoteChoice},
  user::ProfileUpdate,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, wallet: &str) -> i64 {
  s.find_or_create_user(wallet.into()).await.unwrap().0.id
}

async fn dare(s: &SqliteStore, creator: &str, deadline: &str) -> i64 {
  let input = NewDare::new(
    "Cold plunge",
    "Five minutes in ice water",
    10.0,
    creator,
    deadline.parse().unwrap(),
  );
  s.create_dare(input).await.unwrap().id
}

async fn submit(s: &SqliteStore, wallet: &str, dare_id: i64) -> i64 {
  s.submit_proof(NewSubmission {
    dare_id,
    wallet_address: wallet.into(),
    description: "done".into(),
    file_cid: format!("bafy-{wallet}"),
  })
  .await
  .unwrap()
  .id
}

/// Sweep far enough ahead that any "1 days" dare is in voting.
async fn start_voting(s: &SqliteStore) {
  s.sweep_expired(Utc::now() + Duration::days(2)).await.unwrap();
}

async fn count(s: &SqliteStore, sql: &'static str) -> i64 {
  s.conn
    .call(move |c| Ok(c.query_row(sql, [], |r| r.get(0))?))
    .await
    .unwrap()
}

async fn exec(s: &SqliteStore, sql: &'static str) {
  s.conn
    .call(move |c| Ok(c.execute_batch(sql)?))
    .await
    .unwrap()
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_or_create_is_idempotent() {
  let s = store().await;
  let (first, created) = s.find_or_create_user("0xAAA".into()).await.unwrap();
  assert!(created);
  let (again, created) = s.find_or_create_user("0xAAA".into()).await.unwrap();
  assert!(!created);
  assert_eq!(first.id, again.id);
  assert_eq!(again.rank, 1);
}

#[tokio::test]
async fn update_profile_keeps_unset_fields() {
  let s = store().await;
  user(&s, "0xAAA").await;

  let update = ProfileUpdate { username: Some("ada".into()), bio: Some("hi".into()), avatar: None };
  s.update_profile("0xAAA".into(), update).await.unwrap();
  let update = ProfileUpdate { bio: Some("hello".into()), ..Default::default() };
  let user = s.update_profile("0xAAA".into(), update).await.unwrap();

  assert_eq!(user.username.as_deref(), Some("ada"));
  assert_eq!(user.bio.as_deref(), Some("hello"));

  let err = s.update_profile("0xNOPE".into(), ProfileUpdate::default()).await.unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn rank_uses_competition_ranking() {
  let s = store().await;
  for wallet in ["0x1", "0x2", "0x3"] {
    user(&s, wallet).await;
  }
  s.conn
    .call(|c| {
      c.execute("UPDATE users SET daresCompleted = 10 WHERE walletAddress IN ('0x1', '0x2')", [])?;
      c.execute("UPDATE users SET daresCompleted = 5 WHERE walletAddress = '0x3'", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let board = s.leaderboard(100).await.unwrap();
  let ranks: Vec<_> = board.iter().map(|e| (e.wallet_address.as_str(), e.rank)).collect();
  assert_eq!(ranks, [("0x1", 1), ("0x2", 1), ("0x3", 3)]);

  let third = s.get_user("0x3".into()).await.unwrap().unwrap();
  assert_eq!(third.rank, 3);

  let top = s.leaderboard(1).await.unwrap();
  assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn profile_stats_and_achievements() {
  let s = store().await;
  dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;

  let stats = s.profile_stats("0xAAA".into()).await.unwrap();
  assert_eq!(stats.user.dares_created, 1);
  assert_eq!(stats.total_users, 2);
  assert_eq!(stats.votes_cast, 0);

  let achievements = s.achievements("0xAAA".into()).await.unwrap();
  let creator = achievements.iter().find(|a| a.id == "creator").unwrap();
  assert!(creator.unlocked);
  let first = achievements.iter().find(|a| a.id == "first-dare").unwrap();
  assert!(!first.unlocked);
}

// ─── Dares ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_dare_counts_for_creator() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "7 days").await;

  let d = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!(d.status, DareStatus::Open);
  assert_eq!(d.deadline, Deadline::days(7));
  assert_eq!((d.participants, d.likes, d.comments), (0, 0, 0));

  let creator = s.get_user("0xAAA".into()).await.unwrap().unwrap();
  assert_eq!(creator.dares_created, 1);
}

#[tokio::test]
async fn create_dare_rejects_bad_input() {
  let s = store().await;
  let mut input = NewDare::new("t", "d", 0.0, "0xAAA", Deadline::days(1));
  assert!(matches!(s.create_dare(input.clone()).await, Err(Error::Invalid(_))));

  input.reward = 5.0;
  input.title = "  ".into();
  assert!(matches!(s.create_dare(input.clone()).await, Err(Error::Invalid(_))));

  input.title = "t".into();
  for deadline in [
    Deadline::At(Utc::now() - Duration::seconds(1)),
    "7".parse().unwrap(),
    Deadline::Unparsed("ASAP".into()),
  ] {
    input.deadline = deadline;
    assert!(matches!(s.create_dare(input.clone()).await, Err(Error::Invalid(_))));
  }

  // Nothing was written for the failed attempts.
  assert!(s.get_user("0xAAA".into()).await.unwrap().is_none());

  input.deadline = Deadline::At(Utc::now() + Duration::days(1));
  let d = s.create_dare(input).await.unwrap();
  assert!(d.expires_at().is_some_and(|at| at > Utc::now()));
}

#[tokio::test]
async fn unparseable_stored_deadline_does_not_break_reads() {
  let s = store().await;
  let bad = dare(&s, "0xAAA", "1 days").await;
  dare(&s, "0xAAA", "1 days").await;
  s.conn
    .call(move |c| {
      c.execute("UPDATE dares SET deadline = 'ASAP' WHERE id = ?1", [bad])?;
      Ok(())
    })
    .await
    .unwrap();

  assert_eq!(s.list_dares(None, None).await.unwrap().len(), 2);
  let d = s.get_dare(bad).await.unwrap().unwrap();
  assert_eq!(d.deadline, Deadline::Unparsed("ASAP".into()));
  assert_eq!(d.expires_at(), None);

  // A deadline that fails to decode from storage is a server-side fault.
  let err = Error::Core(darex_core::Error::InvalidDeadline("ASAP".into()));
  assert_eq!(err.kind(), ErrorKind::Internal);
}

#[tokio::test]
async fn list_dares_marks_viewer_state() {
  let s = store().await;
  let first = dare(&s, "0xAAA", "7 days").await;
  let second = dare(&s, "0xAAA", "7 days").await;
  user(&s, "0xBBB").await;
  s.accept_dare("0xBBB".into(), first).await.unwrap();
  s.toggle_dare_like("0xBBB".into(), second).await.unwrap();

  let listed = s.list_dares(Some("0xBBB".into()), None).await.unwrap();
  assert_eq!(listed.len(), 2);
  let by_id = |id| listed.iter().find(|l| l.dare.id == id).unwrap();
  assert!(by_id(first).has_accepted && !by_id(first).has_liked);
  assert!(!by_id(second).has_accepted && by_id(second).has_liked);

  let anonymous = s.list_dares(None, Some(DareStatus::Open)).await.unwrap();
  assert!(anonymous.iter().all(|l| !l.has_accepted && !l.has_liked));
  assert!(s.list_dares(None, Some(DareStatus::Voting)).await.unwrap().is_empty());
}

#[tokio::test]
async fn accept_is_idempotent() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "7 days").await;
  user(&s, "0xBBB").await;

  s.accept_dare("0xBBB".into(), id).await.unwrap();
  let err = s.accept_dare("0xBBB".into(), id).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyAccepted));

  assert_eq!(s.get_dare(id).await.unwrap().unwrap().participants, 1);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM user_dares").await, 1);
}

#[tokio::test]
async fn accept_rejections() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;

  assert!(matches!(
    s.accept_dare("0xNOPE".into(), id).await,
    Err(Error::UserNotFound(_))
  ));
  assert!(matches!(
    s.accept_dare("0xBBB".into(), 999).await,
    Err(Error::DareNotFound(999))
  ));
  assert!(matches!(
    s.accept_dare("0xAAA".into(), id).await,
    Err(Error::CreatorCannotParticipate)
  ));

  start_voting(&s).await;
  assert!(matches!(
    s.accept_dare("0xBBB".into(), id).await,
    Err(Error::WrongStatus { actual: DareStatus::Voting, .. })
  ));
  assert_eq!(s.get_dare(id).await.unwrap().unwrap().participants, 0);
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_toggle_is_symmetric() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "7 days").await;
  user(&s, "0xBBB").await;

  let on = s.toggle_dare_like("0xBBB".into(), id).await.unwrap();
  assert!(on.liked);
  assert_eq!(on.likes, 1);
  let off = s.toggle_dare_like("0xBBB".into(), id).await.unwrap();
  assert!(!off.liked);
  assert_eq!(off.likes, 0);

  assert!(matches!(
    s.toggle_dare_like("0xBBB".into(), 42).await,
    Err(Error::DareNotFound(42))
  ));
}

#[tokio::test]
async fn concurrent_like_toggles_keep_counter_exact() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "7 days").await;
  let wallets = ["0xB1", "0xB2", "0xB3", "0xB4"];
  for w in wallets {
    user(&s, w).await;
  }

  // 0xB1 toggles three times, the others once each.
  let mut set = tokio::task::JoinSet::new();
  for w in wallets.iter().chain(["0xB1", "0xB1"].iter()) {
    let s = s.clone();
    let w = w.to_string();
    set.spawn(async move { s.toggle_dare_like(w, id).await });
  }
  while let Some(res) = set.join_next().await {
    res.unwrap().unwrap();
  }

  let d = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!(d.likes, 4);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM dare_likes").await, d.likes);
  let listed = s.list_dares(Some("0xB1".into()), None).await.unwrap();
  assert!(listed[0].has_liked);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_and_replies() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "7 days").await;
  user(&s, "0xBBB").await;

  let top = s.add_comment("0xBBB".into(), id, "I'm in".into(), None).await.unwrap();
  let reply = s
    .add_comment("0xAAA".into(), id, "Good luck".into(), Some(top.id))
    .await
    .unwrap();
  assert_eq!(reply.replying_to, Some(top.id));
  s.toggle_comment_like("0xAAA".into(), top.id).await.unwrap();

  let view = s.list_comments(id, Some("0xAAA".into())).await.unwrap();
  assert_eq!(view.len(), 2);
  assert_eq!(view[0].comment.id, top.id);
  assert!(view[0].has_liked);
  assert_eq!(view[0].comment.likes, 1);
  assert_eq!(view[1].replying_to_wallet.as_deref(), Some("0xBBB"));
  assert_eq!(s.get_dare(id).await.unwrap().unwrap().comments, 2);

  assert!(matches!(
    s.add_comment("0xBBB".into(), id, "   ".into(), None).await,
    Err(Error::Invalid(_))
  ));
  let other = dare(&s, "0xAAA", "7 days").await;
  assert!(matches!(
    s.add_comment("0xBBB".into(), other, "x".into(), Some(top.id)).await,
    Err(Error::CommentNotFound(_))
  ));
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sweep_advances_only_expired_dares() {
  let s = store().await;
  let short = dare(&s, "0xAAA", "7 days").await;
  let long = dare(&s, "0xAAA", "30 days").await;

  let report = s.sweep_expired(Utc::now() + Duration::days(8)).await.unwrap();
  assert_eq!(report.advanced, vec![short]);
  assert!(report.failed.is_empty());
  assert_eq!(s.get_dare(short).await.unwrap().unwrap().status, DareStatus::Voting);
  assert_eq!(s.get_dare(long).await.unwrap().unwrap().status, DareStatus::Open);

  // A later sweep never touches dares already past open.
  let report = s.sweep_expired(Utc::now() + Duration::days(8)).await.unwrap();
  assert!(report.advanced.is_empty());
  assert_eq!(s.get_dare(short).await.unwrap().unwrap().status, DareStatus::Voting);
}

#[tokio::test]
async fn sweep_reports_undecodable_rows_and_continues() {
  let s = store().await;
  let bad = dare(&s, "0xAAA", "1 days").await;
  let good = dare(&s, "0xAAA", "1 days").await;
  s.conn
    .call(move |c| {
      c.execute("UPDATE dares SET deadline = 'ASAP' WHERE id = ?1", [bad])?;
      Ok(())
    })
    .await
    .unwrap();

  let report = s.sweep_expired(Utc::now() + Duration::days(2)).await.unwrap();
  assert_eq!(report.advanced, vec![good]);
  assert_eq!(report.failed.len(), 1);
  assert_eq!(report.failed[0].0, bad);
}

#[tokio::test]
async fn sweep_store_failure_on_one_dare_spares_the_rest() {
  let s = store().await;
  let bad = dare(&s, "0xBAD", "1 days").await;
  let good = dare(&s, "0xAAA", "1 days").await;
  exec(
    &s,
    "CREATE TRIGGER reject_bad_notes BEFORE INSERT ON notifications
     WHEN NEW.userId = (SELECT id FROM users WHERE walletAddress = '0xBAD')
     BEGIN SELECT RAISE(ABORT, 'row failure'); END;",
  )
  .await;

  let report = s.sweep_expired(Utc::now() + Duration::days(2)).await.unwrap();
  assert_eq!(report.advanced, vec![good]);
  assert_eq!(report.failed.len(), 1);
  assert_eq!(report.failed[0].0, bad);
  assert!(report.failed[0].1.contains("row failure"), "{}", report.failed[0].1);

  // The failed dare's status change was rolled back with its notification.
  assert_eq!(s.get_dare(bad).await.unwrap().unwrap().status, DareStatus::Open);
  assert_eq!(s.get_dare(good).await.unwrap().unwrap().status, DareStatus::Voting);
  let notes = s.list_notifications("0xAAA".into(), false).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].kind, NotificationKind::VotingStarted);

  exec(&s, "DROP TRIGGER reject_bad_notes;").await;
  let report = s.sweep_expired(Utc::now() + Duration::days(2)).await.unwrap();
  assert_eq!(report.advanced, vec![bad]);
  assert!(report.failed.is_empty());
}

#[tokio::test]
async fn sweep_handles_legacy_active_label() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  s.conn
    .call(move |c| {
      c.execute("UPDATE dares SET status = 'active' WHERE id = ?1", [id])?;
      Ok(())
    })
    .await
    .unwrap();

  assert_eq!(s.get_dare(id).await.unwrap().unwrap().status, DareStatus::Open);
  start_voting(&s).await;
  assert_eq!(s.get_dare(id).await.unwrap().unwrap().status, DareStatus::Voting);
}

#[tokio::test]
async fn end_to_end_dare_reaches_voting() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;
  s.accept_dare("0xBBB".into(), id).await.unwrap();
  submit(&s, "0xBBB", id).await;

  let report = s.sweep_expired(Utc::now() + Duration::days(2)).await.unwrap();
  assert_eq!(report.advanced, vec![id]);

  let d = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!(d.status, DareStatus::Voting);
  assert_eq!(d.participants, 1);
  let bbb = s.get_user("0xBBB".into()).await.unwrap().unwrap();
  assert_eq!(bbb.dares_completed, 0);

  let sub = s.get_submission(id, "0xBBB".into()).await.unwrap().unwrap();
  assert_eq!(sub.status, SubmissionStatus::Pending);
}

// ─── Voting ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_proof_rules() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;

  let creator = NewSubmission {
    dare_id:        id,
    wallet_address: "0xAAA".into(),
    description:    "me".into(),
    file_cid:       "bafy".into(),
  };
  assert!(matches!(
    s.submit_proof(creator.clone()).await,
    Err(Error::CreatorCannotParticipate)
  ));
  let missing = NewSubmission { wallet_address: "0xBBB".into(), file_cid: "".into(), ..creator };
  assert!(matches!(s.submit_proof(missing).await, Err(Error::Invalid(_))));

  start_voting(&s).await;
  let late = NewSubmission {
    dare_id:        id,
    wallet_address: "0xBBB".into(),
    description:    "late".into(),
    file_cid:       "bafy".into(),
  };
  assert!(matches!(s.submit_proof(late).await, Err(Error::WrongStatus { .. })));
  assert!(s.get_submission(id, "0xBBB".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn vote_and_finalize_by_tally() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  for w in ["0xBBB", "0xCCC", "0xDDD"] {
    user(&s, w).await;
  }
  let bbb = submit(&s, "0xBBB", id).await;
  let ccc = submit(&s, "0xCCC", id).await;

  // Votes only count once the dare is in voting.
  assert!(matches!(
    s.cast_vote("0xDDD".into(), bbb, VoteChoice::Yes).await,
    Err(Error::WrongStatus { .. })
  ));
  start_voting(&s).await;

  s.cast_vote("0xDDD".into(), bbb, VoteChoice::Yes).await.unwrap();
  s.cast_vote("0xDDD".into(), ccc, VoteChoice::No).await.unwrap();
  s.cast_vote("0xCCC".into(), bbb, VoteChoice::Yes).await.unwrap();
  s.cast_vote("0xBBB".into(), ccc, VoteChoice::Yes).await.unwrap();
  assert!(matches!(
    s.cast_vote("0xBBB".into(), bbb, VoteChoice::Yes).await,
    Err(Error::SelfVote)
  ));
  assert!(matches!(
    s.cast_vote("0xDDD".into(), bbb, VoteChoice::No).await,
    Err(Error::AlreadyVoted)
  ));

  let summary = s.voting_summary(id).await.unwrap().unwrap();
  assert_eq!(summary.submissions.len(), 2);
  assert_eq!(summary.submissions[0].votes.yes, 2);
  assert_eq!(summary.submissions[1].votes.no, 1);

  assert!(matches!(
    s.finalize_dare("0xBBB".into(), id, None).await,
    Err(Error::NotCreator)
  ));
  let outcome = s.finalize_dare("0xAAA".into(), id, None).await.unwrap();
  assert_eq!(outcome.winner.as_deref(), Some("0xBBB"));
  assert_eq!(outcome.winning_submission, Some(bbb));
  assert_eq!(outcome.reward, 10.0);

  let d = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!(d.status, DareStatus::Completed);
  assert_eq!(d.winner.as_deref(), Some("0xBBB"));

  let winner = s.get_user("0xBBB".into()).await.unwrap().unwrap();
  assert_eq!(winner.dares_completed, 1);
  assert_eq!(winner.total_earned, 10.0);
  assert_eq!((winner.current_streak, winner.longest_streak), (1, 1));
  // 0xBBB voted yes on the rejected submission.
  assert_eq!(winner.voting_accuracy, 0);
  let ddd = s.get_user("0xDDD".into()).await.unwrap().unwrap();
  assert_eq!(ddd.voting_accuracy, 100);

  let losing = s.get_submission(id, "0xCCC".into()).await.unwrap().unwrap();
  assert_eq!(losing.status, SubmissionStatus::Rejected);

  assert!(matches!(
    s.finalize_dare("0xAAA".into(), id, None).await,
    Err(Error::WrongStatus { actual: DareStatus::Completed, .. })
  ));
}

#[tokio::test]
async fn finalize_with_explicit_submission() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;
  user(&s, "0xCCC").await;
  submit(&s, "0xBBB", id).await;
  let ccc = submit(&s, "0xCCC", id).await;
  start_voting(&s).await;

  assert!(matches!(
    s.finalize_dare("0xAAA".into(), id, Some(9_999)).await,
    Err(Error::SubmissionNotFound(9_999))
  ));
  let outcome = s.finalize_dare("0xAAA".into(), id, Some(ccc)).await.unwrap();
  assert_eq!(outcome.winner.as_deref(), Some("0xCCC"));

  let notes = s.list_notifications("0xBBB".into(), false).await.unwrap();
  assert_eq!(notes[0].kind, NotificationKind::SubmissionRejected);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_respect_settings() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "7 days").await;
  for w in ["0xBBB", "0xCCC"] {
    user(&s, w).await;
  }

  s.accept_dare("0xBBB".into(), id).await.unwrap();
  let unread = s.list_notifications("0xAAA".into(), true).await.unwrap();
  assert_eq!(unread.len(), 1);
  assert_eq!(unread[0].kind, NotificationKind::DareAccepted);

  let off = NotificationSettings { dare_updates: false, ..Default::default() };
  let saved = s.update_notification_settings("0xAAA".into(), off).await.unwrap();
  assert_eq!(saved, off);
  assert_eq!(s.notification_settings("0xAAA".into()).await.unwrap(), off);

  s.accept_dare("0xCCC".into(), id).await.unwrap();
  assert_eq!(s.list_notifications("0xAAA".into(), false).await.unwrap().len(), 1);

  // Comments are still on.
  s.add_comment("0xCCC".into(), id, "hi".into(), None).await.unwrap();
  assert_eq!(s.mark_all_read("0xAAA".into()).await.unwrap(), 2);
  assert!(s.list_notifications("0xAAA".into(), true).await.unwrap().is_empty());

  assert!(matches!(
    s.mark_notification_read("0xAAA".into(), 12_345).await,
    Err(Error::NotificationNotFound(12_345))
  ));

  // Only the owner may mark a notification read.
  let note_id = s.list_notifications("0xAAA".into(), false).await.unwrap()[0].id;
  assert!(matches!(
    s.mark_notification_read("0xCCC".into(), note_id).await,
    Err(Error::NotificationNotFound(id)) if id == note_id
  ));
  s.mark_notification_read("0xAAA".into(), note_id).await.unwrap();
}

#[tokio::test]
async fn settings_default_to_enabled() {
  let s = store().await;
  user(&s, "0xAAA").await;
  let settings = s.notification_settings("0xAAA".into()).await.unwrap();
  assert_eq!(settings, NotificationSettings::default());
}

// ─── Account deletion ────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_user_cascades() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;
  user(&s, "0xCCC").await;

  s.accept_dare("0xBBB".into(), id).await.unwrap();
  s.accept_dare("0xCCC".into(), id).await.unwrap();
  s.toggle_dare_like("0xBBB".into(), id).await.unwrap();
  let top = s.add_comment("0xBBB".into(), id, "first".into(), None).await.unwrap();
  let reply = s.add_comment("0xCCC".into(), id, "reply".into(), Some(top.id)).await.unwrap();
  s.toggle_comment_like("0xCCC".into(), top.id).await.unwrap();
  s.toggle_comment_like("0xBBB".into(), reply.id).await.unwrap();
  let bbb_sub = submit(&s, "0xBBB", id).await;
  let ccc_sub = submit(&s, "0xCCC", id).await;
  start_voting(&s).await;
  s.cast_vote("0xCCC".into(), bbb_sub, VoteChoice::Yes).await.unwrap();
  s.cast_vote("0xBBB".into(), ccc_sub, VoteChoice::Yes).await.unwrap();

  s.delete_user("0xBBB".into()).await.unwrap();
  assert!(s.get_user("0xBBB".into()).await.unwrap().is_none());

  let d = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!((d.participants, d.likes, d.comments), (1, 0, 1));

  let comments = s.list_comments(id, None).await.unwrap();
  assert_eq!(comments.len(), 1);
  assert_eq!(comments[0].comment.id, reply.id);
  assert_eq!(comments[0].comment.replying_to, None);
  assert_eq!(comments[0].comment.likes, 0);

  assert_eq!(count(&s, "SELECT COUNT(*) FROM votes").await, 0);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM submissions").await, 1);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM dare_comment_likes").await, 0);

  assert!(matches!(
    s.delete_user("0xBBB".into()).await,
    Err(Error::UserNotFound(_))
  ));
}

#[tokio::test]
async fn delete_user_failure_rolls_back_everything() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;
  s.accept_dare("0xBBB".into(), id).await.unwrap();
  s.toggle_dare_like("0xBBB".into(), id).await.unwrap();
  s.add_comment("0xBBB".into(), id, "first".into(), None).await.unwrap();
  submit(&s, "0xBBB", id).await;

  // The user row is removed last, so this fails after every other delete.
  exec(
    &s,
    "CREATE TRIGGER keep_users BEFORE DELETE ON users
     BEGIN SELECT RAISE(ABORT, 'delete blocked'); END;",
  )
  .await;
  assert!(s.delete_user("0xBBB".into()).await.is_err());

  assert!(s.get_user("0xBBB".into()).await.unwrap().is_some());
  let d = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!((d.participants, d.likes, d.comments), (1, 1, 1));
  assert_eq!(count(&s, "SELECT COUNT(*) FROM user_dares").await, 1);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM dare_likes").await, 1);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM dare_comments").await, 1);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM submissions").await, 1);
  assert_eq!(count(&s, "SELECT COUNT(*) FROM notifications").await, 2);
}

// ─── Activity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn activity_feed_is_newest_first() {
  let s = store().await;
  let id = dare(&s, "0xAAA", "1 days").await;
  user(&s, "0xBBB").await;
  user(&s, "0xCCC").await;
  s.accept_dare("0xBBB".into(), id).await.unwrap();
  let bbb_sub = submit(&s, "0xBBB", id).await;
  let ccc_sub = submit(&s, "0xCCC", id).await;
  start_voting(&s).await;
  s.cast_vote("0xBBB".into(), ccc_sub, VoteChoice::No).await.unwrap();
  s.finalize_dare("0xAAA".into(), id, Some(bbb_sub)).await.unwrap();

  let feed = s.user_activities("0xBBB".into(), 10).await.unwrap();
  let kinds: Vec<_> = feed.iter().map(|a| a.kind).collect();
  assert_eq!(
    kinds,
    [ActivityKind::Completed, ActivityKind::Voted, ActivityKind::Submitted, ActivityKind::Accepted]
  );
  assert!(feed.iter().all(|a| a.dare_id == id));
  assert_eq!(feed[0].reward, 10.0);
  assert_eq!(feed[1].description, "Voted no on a submission for \"Cold plunge\"");
  assert_eq!(feed[1].reward, 0.0);

  let creator = s.user_activities("0xAAA".into(), 10).await.unwrap();
  assert_eq!(creator.iter().map(|a| a.kind).collect::<Vec<_>>(), [ActivityKind::Created]);

  assert_eq!(s.user_activities("0xBBB".into(), 2).await.unwrap().len(), 2);
  assert!(matches!(
    s.user_activities("0xNOBODY".into(), 10).await,
    Err(Error::UserNotFound(_))
  ));
}

// ─── Chain sync ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn sync_projects_and_settles_chain_state() {
  const ETHER: u128 = 1_000_000_000_000_000_000;
  let s = store().await;
  let now = Utc::now().timestamp();
  let deadline = now + 86_400;

  let mut chain = EscrowContract::new("0xOWNER");
  let chain_id = chain
    .create_dare("0xAAA", 10 * ETHER, "Cold plunge", "Ice water", 10 * ETHER, deadline, now)
    .unwrap();

  let report = s.sync_onchain(chain.snapshot()).await.unwrap();
  assert_eq!(report, SyncReport { inserted: 1, updated: 0, unchanged: 0 });
  let report = s.sync_onchain(chain.snapshot()).await.unwrap();
  assert_eq!(report, SyncReport { inserted: 0, updated: 0, unchanged: 1 });

  let listed = s.list_dares(None, None).await.unwrap();
  let projected = &listed[0].dare;
  assert_eq!(projected.chain_dare_id, Some(chain_id));
  assert_eq!(projected.reward, 10.0);
  assert_eq!(projected.status, DareStatus::Open);

  user(&s, "0xBBB").await;
  submit(&s, "0xBBB", projected.id).await;
  let sub = chain.submit_proof("0xBBB", chain_id, "bafy-0xBBB", now).unwrap();
  chain.complete_dare("0xAAA", chain_id, Some(sub), deadline + 1).unwrap();
  chain.claim_reward("0xBBB", chain_id).unwrap();

  let report = s.sync_onchain(chain.snapshot()).await.unwrap();
  assert_eq!(report, SyncReport { inserted: 0, updated: 1, unchanged: 0 });
  let report = s.sync_onchain(chain.snapshot()).await.unwrap();
  assert_eq!(report, SyncReport { inserted: 0, updated: 0, unchanged: 1 });

  let settled = s.get_dare(projected.id).await.unwrap().unwrap();
  assert_eq!(settled.status, DareStatus::Completed);
  assert_eq!(settled.winner.as_deref(), Some("0xBBB"));
  assert!(settled.reward_claimed);

  let winner = s.get_user("0xBBB".into()).await.unwrap().unwrap();
  assert_eq!(winner.dares_completed, 1);
  assert_eq!(winner.total_earned, 10.0);
  let approved = s.get_submission(projected.id, "0xBBB".into()).await.unwrap().unwrap();
  assert_eq!(approved.status, SubmissionStatus::Approved);
}

#[tokio::test]
async fn duplicate_chain_link_conflicts() {
  let s = store().await;
  let mut input = NewDare::new("a", "b", 1.0, "0xAAA", Deadline::days(1));
  input.chain_dare_id = Some(7);
  s.create_dare(input.clone()).await.unwrap();
  assert!(matches!(s.create_dare(input).await, Err(Error::DuplicateChainDare(7))));
}

#[tokio::test]
async fn chain_winner_replaces_an_offchain_winner() {
  const ETHER: u128 = 1_000_000_000_000_000_000;
  let s = store().await;
  let now = Utc::now().timestamp();
  let deadline = now + 86_400;

  let mut chain = EscrowContract::new("0xOWNER");
  let chain_id = chain
    .create_dare("0xAAA", 10 * ETHER, "Cold plunge", "Ice water", 10 * ETHER, deadline, now)
    .unwrap();
  s.sync_onchain(chain.snapshot()).await.unwrap();
  let id = s.list_dares(None, None).await.unwrap()[0].dare.id;

  user(&s, "0xBBB").await;
  user(&s, "0xCCC").await;
  let bbb_sub = submit(&s, "0xBBB", id).await;
  submit(&s, "0xCCC", id).await;
  start_voting(&s).await;
  s.finalize_dare("0xAAA".into(), id, Some(bbb_sub)).await.unwrap();

  let sub = chain.submit_proof("0xCCC", chain_id, "bafy-0xCCC", now).unwrap();
  chain.complete_dare("0xAAA", chain_id, Some(sub), deadline + 1).unwrap();
  let report = s.sync_onchain(chain.snapshot()).await.unwrap();
  assert_eq!(report, SyncReport { inserted: 0, updated: 1, unchanged: 0 });

  let settled = s.get_dare(id).await.unwrap().unwrap();
  assert_eq!(settled.winner.as_deref(), Some("0xCCC"));

  let previous = s.get_user("0xBBB".into()).await.unwrap().unwrap();
  assert_eq!((previous.dares_completed, previous.total_earned), (0, 0.0));
  assert_eq!(previous.current_streak, 0);
  let previous_sub = s.get_submission(id, "0xBBB".into()).await.unwrap().unwrap();
  assert_eq!(previous_sub.status, SubmissionStatus::Rejected);

  let winner = s.get_user("0xCCC".into()).await.unwrap().unwrap();
  assert_eq!((winner.dares_completed, winner.total_earned), (1, 10.0));
  let winning_sub = s.get_submission(id, "0xCCC".into()).await.unwrap().unwrap();
  assert_eq!(winning_sub.status, SubmissionStatus::Approved);

  // Re-applying the snapshot credits nobody twice.
  let report = s.sync_onchain(chain.snapshot()).await.unwrap();
  assert_eq!(report, SyncReport { inserted: 0, updated: 0, unchanged: 1 });
  let winner = s.get_user("0xCCC".into()).await.unwrap().unwrap();
  assert_eq!(winner.dares_completed, 1);
}
