//! In-app notifications and per-user notification preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  DareAccepted,
  Comment,
  VotingStarted,
  SubmissionApproved,
  SubmissionRejected,
}

impl NotificationKind {
  /// Whether `settings` allows this kind of notification to be delivered.
  pub fn enabled_by(self, settings: &NotificationSettings) -> bool {
    match self {
      Self::DareAccepted | Self::VotingStarted => settings.dare_updates,
      Self::Comment => settings.comments,
      Self::SubmissionApproved | Self::SubmissionRejected => settings.submission_status,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id:         i64,
  pub user_id:    i64,
  #[serde(rename = "type")]
  pub kind:       NotificationKind,
  pub message:    String,
  pub is_read:    bool,
  pub created_at: DateTime<Utc>,
}

/// Which notification categories a user wants. Everything is on until the
/// user says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
  pub dare_updates:      bool,
  pub comments:          bool,
  pub submission_status: bool,
}

impl Default for NotificationSettings {
  fn default() -> Self {
    Self { dare_updates: true, comments: true, submission_status: true }
  }
}
