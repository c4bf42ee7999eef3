//! Error types for `darex-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid deadline: {0:?}")]
  InvalidDeadline(String),

  #[error("unknown dare status: {0:?}")]
  UnknownStatus(String),

  #[error("cannot move dare from {from} to {to}")]
  BackwardTransition { from: String, to: String },

  #[error("invalid wei amount: {0:?}")]
  InvalidAmount(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of a store failure, used by the HTTP layer to pick
/// a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Missing or malformed input.
  Invalid,
  /// The caller is known but not allowed to perform the action.
  Forbidden,
  NotFound,
  /// A uniqueness or state precondition failed.
  Conflict,
  Internal,
}

/// Implemented by store error types so callers can classify failures without
/// knowing the concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}
