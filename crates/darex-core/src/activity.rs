//! Per-user activity feed.
//!
//! Nothing is stored for the feed itself; every entry is derived from a row
//! the user already owns (a dare they created, an accept, a submission, a
//! vote, or a win).

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

/// What the user did. Declared in lifecycle order, which also breaks ties
/// between entries with the same timestamp.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
  Created,
  Accepted,
  Submitted,
  Voted,
  Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  /// `<kind>-<row id>`, unique across the feed.
  pub id:          String,
  #[serde(rename = "type")]
  pub kind:        ActivityKind,
  pub dare_id:     i64,
  pub title:       String,
  pub description: String,
  /// Amount earned by this activity; only a win earns anything.
  pub reward:      f64,
  pub timestamp:   DateTime<Utc>,
}

impl Activity {
  /// Build a feed entry. `detail` is the vote cast, for [`ActivityKind::Voted`].
  pub fn new(
    kind: ActivityKind,
    row_id: i64,
    dare_id: i64,
    title: String,
    dare_reward: f64,
    detail: Option<&str>,
    timestamp: DateTime<Utc>,
  ) -> Self {
    let description = match kind {
      ActivityKind::Created => format!("Created \"{title}\""),
      ActivityKind::Accepted => format!("Accepted \"{title}\""),
      ActivityKind::Submitted => format!("Submitted proof for \"{title}\""),
      ActivityKind::Voted => {
        format!("Voted {} on a submission for \"{title}\"", detail.unwrap_or("on"))
      }
      ActivityKind::Completed => format!("Completed \"{title}\""),
    };
    let reward = if kind == ActivityKind::Completed { dare_reward } else { 0.0 };
    Self {
      id: format!("{kind}-{row_id}"),
      kind,
      dare_id,
      title,
      description,
      reward,
      timestamp,
    }
  }
}

/// Order a feed newest first, later lifecycle steps first on equal
/// timestamps, and keep at most `limit` entries.
pub fn newest_first(mut feed: Vec<Activity>, limit: usize) -> Vec<Activity> {
  feed.sort_by(|a, b| (b.timestamp, b.kind).cmp(&(a.timestamp, a.kind)));
  feed.truncate(limit);
  feed
}
