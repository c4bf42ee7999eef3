//! Model of the on-chain reward escrow.
//!
//! [`EscrowContract`] reproduces the contract's state machine: a dare locks
//! its reward when created, collects proof submissions until its deadline,
//! is completed by its creator (or the contract owner) who picks a winner,
//! and finally pays out once to that winner. Failed calls revert with the
//! same reason strings the contract uses and leave state untouched.
//!
//! Block time is supplied by the caller as unix seconds so the model is
//! deterministic. [`EscrowContract::snapshot`] exports the per-dare state in
//! the shape the relational projection is reconciled against.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Amounts are held in the token's smallest unit.
pub type Wei = u128;

/// Decimal places between [`Wei`] and whole reward units.
pub const REWARD_DECIMALS: u32 = 18;

/// Convert an on-chain amount into the whole-unit value stored off-chain.
pub fn wei_to_units(amount: Wei) -> f64 { amount as f64 / 10f64.powi(REWARD_DECIMALS as i32) }

// ─── Identity gate ───────────────────────────────────────────────────────────

/// Answers whether an address has passed identity verification.
pub trait IdentityRegistry {
  fn is_verified(&self, address: &str) -> bool;
}

/// Registry for the ungated contract: every address is verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ungated;

impl IdentityRegistry for Ungated {
  fn is_verified(&self, _address: &str) -> bool { true }
}

/// An explicit allow-list of verified addresses.
#[derive(Debug, Clone, Default)]
pub struct VerifiedSet(HashSet<String>);

impl VerifiedSet {
  pub fn set_verified(&mut self, address: &str, verified: bool) {
    if verified {
      self.0.insert(address.to_owned());
    } else {
      self.0.remove(address);
    }
  }
}

impl IdentityRegistry for VerifiedSet {
  fn is_verified(&self, address: &str) -> bool { self.0.contains(address) }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Per-dare contract state, as exported to the off-chain projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnChainDare {
  pub id:             u64,
  pub creator:        String,
  pub title:          String,
  pub description:    String,
  /// Decimal string on the wire; JSON numbers cannot carry 18 decimals.
  #[serde(with = "wei_string")]
  pub reward:         Wei,
  /// Unix seconds.
  pub deadline:       i64,
  pub completed:      bool,
  pub winner:         Option<String>,
  pub reward_claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSubmission {
  pub id:          u64,
  pub dare_id:     u64,
  pub participant: String,
  #[serde(rename = "proofCID")]
  pub proof_cid:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum EscrowEvent {
  DareCreated { dare_id: u64, creator: String, reward: String },
  DareSubmitted { dare_id: u64, submission_id: u64, participant: String },
  DareCompleted { dare_id: u64, winner: String },
  RewardClaimed { dare_id: u64, winner: String, amount: String },
}

/// An event together with the hash of the transaction that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedEvent {
  pub tx_hash: String,
  pub event:   EscrowEvent,
}

/// Why a contract call reverted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Revert {
  #[error("Identity not verified")]
  IdentityNotVerified,
  #[error("Reward must be positive")]
  ZeroReward,
  #[error("Reward must match sent value")]
  ValueMismatch,
  #[error("Deadline must be in the future")]
  DeadlineInPast,
  #[error("Dare does not exist")]
  UnknownDare,
  #[error("Dare already completed")]
  AlreadyCompleted,
  #[error("Deadline passed")]
  DeadlinePassed,
  #[error("Creator cannot participate")]
  CreatorCannotParticipate,
  #[error("Proof required")]
  EmptyProof,
  #[error("Not authorized")]
  NotAuthorized,
  #[error("Deadline not reached")]
  DeadlineNotReached,
  #[error("No submissions")]
  NoSubmissions,
  #[error("Submission not for this dare")]
  ForeignSubmission,
  #[error("Dare not completed")]
  NotCompleted,
  #[error("Not the winner")]
  NotWinner,
  #[error("Reward already claimed")]
  AlreadyClaimed,
}

// ─── Contract ────────────────────────────────────────────────────────────────

pub struct EscrowContract<R = Ungated> {
  owner:       String,
  registry:    R,
  dares:       BTreeMap<u64, OnChainDare>,
  submissions: BTreeMap<u64, ProofSubmission>,
  /// Rewards currently locked in the contract.
  balance:     Wei,
  /// Rewards paid out, per recipient.
  payouts:     BTreeMap<String, Wei>,
  events:      Vec<LoggedEvent>,
  nonce:       u64,
}

impl EscrowContract<Ungated> {
  pub fn new(owner: impl Into<String>) -> Self { Self::with_registry(owner, Ungated) }
}

impl<R: IdentityRegistry> EscrowContract<R> {
  pub fn with_registry(owner: impl Into<String>, registry: R) -> Self {
    Self {
      owner: owner.into(),
      registry,
      dares: BTreeMap::new(),
      submissions: BTreeMap::new(),
      balance: 0,
      payouts: BTreeMap::new(),
      events: Vec::new(),
      nonce: 0,
    }
  }

  pub fn registry_mut(&mut self) -> &mut R { &mut self.registry }

  pub fn dare(&self, id: u64) -> Option<&OnChainDare> { self.dares.get(&id) }

  pub fn submission(&self, id: u64) -> Option<&ProofSubmission> { self.submissions.get(&id) }

  pub fn balance(&self) -> Wei { self.balance }

  pub fn paid_out(&self, address: &str) -> Wei {
    self.payouts.get(address).copied().unwrap_or(0)
  }

  pub fn events(&self) -> &[LoggedEvent] { &self.events }

  /// Current state of every dare, ordered by id.
  pub fn snapshot(&self) -> Vec<OnChainDare> { self.dares.values().cloned().collect() }

  /// Lock `value` as the reward of a new dare. Returns the dare id; ids start
  /// at 1.
  #[allow(clippy::too_many_arguments)]
  pub fn create_dare(
    &mut self,
    caller: &str,
    value: Wei,
    title: &str,
    description: &str,
    reward: Wei,
    deadline: i64,
    now: i64,
  ) -> Result<u64, Revert> {
    self.require_verified(caller)?;
    if reward == 0 {
      return Err(Revert::ZeroReward);
    }
    if value != reward {
      return Err(Revert::ValueMismatch);
    }
    if deadline <= now {
      return Err(Revert::DeadlineInPast);
    }

    let id = self.dares.len() as u64 + 1;
    self.dares.insert(id, OnChainDare {
      id,
      creator: caller.to_owned(),
      title: title.to_owned(),
      description: description.to_owned(),
      reward,
      deadline,
      completed: false,
      winner: None,
      reward_claimed: false,
    });
    self.balance += value;
    self.emit(caller, "createDare", EscrowEvent::DareCreated {
      dare_id: id,
      creator: caller.to_owned(),
      reward:  reward.to_string(),
    });
    Ok(id)
  }

  pub fn submit_proof(
    &mut self,
    caller: &str,
    dare_id: u64,
    proof_cid: &str,
    now: i64,
  ) -> Result<u64, Revert> {
    let dare = self.dares.get(&dare_id).ok_or(Revert::UnknownDare)?;
    if dare.completed {
      return Err(Revert::AlreadyCompleted);
    }
    if now > dare.deadline {
      return Err(Revert::DeadlinePassed);
    }
    if dare.creator == caller {
      return Err(Revert::CreatorCannotParticipate);
    }
    self.require_verified(caller)?;
    if proof_cid.trim().is_empty() {
      return Err(Revert::EmptyProof);
    }

    let id = self.submissions.len() as u64 + 1;
    self.submissions.insert(id, ProofSubmission {
      id,
      dare_id,
      participant: caller.to_owned(),
      proof_cid: proof_cid.to_owned(),
    });
    self.emit(caller, "submitProof", EscrowEvent::DareSubmitted {
      dare_id,
      submission_id: id,
      participant: caller.to_owned(),
    });
    Ok(id)
  }

  /// Close a dare after its deadline and record the winner: `submission_id`
  /// if given, otherwise the dare's first submission.
  pub fn complete_dare(
    &mut self,
    caller: &str,
    dare_id: u64,
    submission_id: Option<u64>,
    now: i64,
  ) -> Result<String, Revert> {
    let dare = self.dares.get(&dare_id).ok_or(Revert::UnknownDare)?;
    if caller != dare.creator && caller != self.owner {
      return Err(Revert::NotAuthorized);
    }
    if dare.completed {
      return Err(Revert::AlreadyCompleted);
    }
    if now <= dare.deadline {
      return Err(Revert::DeadlineNotReached);
    }

    let chosen = match submission_id {
      Some(id) => {
        let sub = self.submissions.get(&id).ok_or(Revert::ForeignSubmission)?;
        if sub.dare_id != dare_id {
          return Err(Revert::ForeignSubmission);
        }
        sub
      }
      None => self
        .submissions
        .values()
        .find(|s| s.dare_id == dare_id)
        .ok_or(Revert::NoSubmissions)?,
    };
    let winner = chosen.participant.clone();

    if let Some(dare) = self.dares.get_mut(&dare_id) {
      dare.completed = true;
      dare.winner = Some(winner.clone());
    }
    self.emit(caller, "completeDare", EscrowEvent::DareCompleted {
      dare_id,
      winner: winner.clone(),
    });
    Ok(winner)
  }

  /// Pay the escrowed reward to the dare's winner. Returns the amount paid.
  pub fn claim_reward(&mut self, caller: &str, dare_id: u64) -> Result<Wei, Revert> {
    let dare = self.dares.get_mut(&dare_id).ok_or(Revert::UnknownDare)?;
    if !dare.completed {
      return Err(Revert::NotCompleted);
    }
    if dare.winner.as_deref() != Some(caller) {
      return Err(Revert::NotWinner);
    }
    if dare.reward_claimed {
      return Err(Revert::AlreadyClaimed);
    }

    dare.reward_claimed = true;
    let amount = dare.reward;
    self.balance -= amount;
    *self.payouts.entry(caller.to_owned()).or_default() += amount;
    self.emit(caller, "claimReward", EscrowEvent::RewardClaimed {
      dare_id,
      winner: caller.to_owned(),
      amount: amount.to_string(),
    });
    Ok(amount)
  }

  fn require_verified(&self, caller: &str) -> Result<(), Revert> {
    if self.registry.is_verified(caller) {
      Ok(())
    } else {
      Err(Revert::IdentityNotVerified)
    }
  }

  fn emit(&mut self, caller: &str, call: &str, event: EscrowEvent) {
    self.nonce += 1;
    let mut hasher = Sha256::new();
    hasher.update(self.nonce.to_be_bytes());
    hasher.update(caller.as_bytes());
    hasher.update(call.as_bytes());
    let tx_hash = format!("0x{}", hex::encode(hasher.finalize()));
    self.events.push(LoggedEvent { tx_hash, event });
  }
}

// ─── Wire helpers ────────────────────────────────────────────────────────────

mod wei_string {
  use super::*;

  pub fn serialize<S: Serializer>(value: &Wei, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Wei, D::Error> {
    let raw = String::deserialize(d)?;
    raw
      .parse()
      .map_err(|_| serde::de::Error::custom(crate::Error::InvalidAmount(raw)))
  }
}
