//! JSON REST API for DareX.
//!
//! Exposes an axum [`Router`] backed by any [`darex_core::store::DareStore`].
//! Successful responses are wrapped as `{"message":"success","data":...}`;
//! errors are `{"error":"..."}` with a status derived from the store error's
//! [`darex_core::ErrorKind`]. Auth, TLS, and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", darex_api::api_router(store.clone()))
//! ```

pub mod comments;
pub mod dares;
pub mod error;
pub mod notifications;
pub mod profile;
pub mod response;
pub mod submissions;
pub mod sync;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use darex_core::store::DareStore;

pub use error::ApiError;

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DareStore + 'static,
{
  Router::new()
    // Users
    .route("/users/findOrCreate", post(users::find_or_create::<S>))
    .route("/users/{wallet}", delete(users::delete::<S>))
    // Dares
    .route("/dares", get(dares::list::<S>).post(dares::create::<S>))
    .route("/dares/{id}", get(dares::get_one::<S>))
    .route("/dares/{id}/accept", post(dares::accept::<S>))
    .route("/dares/{id}/like", post(dares::like::<S>))
    .route("/dares/{id}/voting", get(dares::voting::<S>))
    .route("/dares/{id}/finalize", post(dares::finalize::<S>))
    // Comments
    .route("/dares/{id}/comments", get(comments::list::<S>))
    .route("/dares/{id}/comment", post(comments::create::<S>))
    .route("/comments/{id}/like", post(comments::like::<S>))
    // Submissions and votes
    .route("/submissions", post(submissions::create::<S>))
    .route("/submission", get(submissions::get_one::<S>))
    .route("/submissions/{id}/vote", post(submissions::vote::<S>))
    // Profiles
    .route("/leaderboard", get(profile::leaderboard::<S>))
    .route("/profile", put(profile::update::<S>))
    .route("/profile/{wallet}", get(profile::get_one::<S>))
    .route("/profile/{wallet}/stats", get(profile::stats::<S>))
    .route("/profile/{wallet}/achievements", get(profile::achievements::<S>))
    .route("/profile/{wallet}/activities", get(profile::activities::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/read-all", post(notifications::mark_all_read::<S>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    .route("/settings/notifications", put(notifications::put_settings::<S>))
    .route("/settings/notifications/{wallet}", get(notifications::get_settings::<S>))
    // Chain
    .route("/sync/dares", post(sync::handler::<S>))
    .with_state(store)
}
