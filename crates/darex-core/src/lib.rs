//! Core types and trait definitions for the DareX backend.
//!
//! No HTTP and no database here. The store, API and server crates all depend
//! on it. The escrow contract model lives in [`escrow`].

// `DareStore` spells out `Send` on its returned futures; implementors may
// still write plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod achievement;
pub mod activity;
pub mod dare;
pub mod deadline;
pub mod error;
pub mod escrow;
pub mod leaderboard;
pub mod notification;
pub mod social;
pub mod store;
pub mod submission;
pub mod user;

pub use error::{Error, ErrorKind, Result, StoreError};
