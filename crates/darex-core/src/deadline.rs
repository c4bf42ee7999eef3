//! Typed dare deadlines.
//!
//! A deadline is either relative to the dare's creation time (`"7 days"`) or
//! an absolute instant, which is what the escrow contract records. The text
//! form is validated once when a dare is created; the sweep only ever works
//! with the typed value. Stored text that no longer parses is carried as
//! [`Deadline::Unparsed`] so reads keep working; such a deadline never
//! expires.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Calendar unit of a relative deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineUnit {
  Day,
  Week,
  Month,
}

impl DeadlineUnit {
  fn parse(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "day" | "days" => Some(Self::Day),
      "week" | "weeks" => Some(Self::Week),
      "month" | "months" => Some(Self::Month),
      _ => None,
    }
  }

  fn label(self, amount: u32) -> &'static str {
    match (self, amount) {
      (Self::Day, 1) => "day",
      (Self::Day, _) => "days",
      (Self::Week, 1) => "week",
      (Self::Week, _) => "weeks",
      (Self::Month, 1) => "month",
      (Self::Month, _) => "months",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Deadline {
  /// `amount` units after the dare was created. `amount` is at least 1.
  Relative { amount: u32, unit: DeadlineUnit },
  /// A fixed instant, e.g. the timestamp passed to the escrow contract.
  At(DateTime<Utc>),
  /// Stored text that is not a valid deadline. Never produced by parsing.
  Unparsed(String),
}

impl Deadline {
  pub fn days(amount: u32) -> Self {
    Self::Relative { amount, unit: DeadlineUnit::Day }
  }

  /// Decode a stored column value, keeping unrecognised text as
  /// [`Deadline::Unparsed`] instead of failing.
  pub fn from_stored(text: String) -> Self {
    match text.parse() {
      Ok(deadline) => deadline,
      Err(_) => Self::Unparsed(text),
    }
  }

  /// The instant at which a dare created at `created_at` stops accepting
  /// participants. `None` only if the arithmetic overflows chrono's range.
  pub fn expires_at(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match *self {
      Self::At(at) => Some(at),
      Self::Unparsed(_) => None,
      Self::Relative { amount, unit: DeadlineUnit::Day } => {
        created_at.checked_add_signed(Duration::days(i64::from(amount)))
      }
      Self::Relative { amount, unit: DeadlineUnit::Week } => {
        created_at.checked_add_signed(Duration::weeks(i64::from(amount)))
      }
      Self::Relative { amount, unit: DeadlineUnit::Month } => {
        created_at.checked_add_months(Months::new(amount))
      }
    }
  }

  pub fn has_passed(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    self.expires_at(created_at).is_some_and(|at| at <= now)
  }
}

impl fmt::Display for Deadline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Relative { amount, unit } => write!(f, "{amount} {}", unit.label(*amount)),
      Self::At(at) => f.write_str(&at.to_rfc3339()),
      Self::Unparsed(text) => f.write_str(text),
    }
  }
}

impl FromStr for Deadline {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let invalid = || Error::InvalidDeadline(s.to_owned());

    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
      return Ok(Self::At(at.with_timezone(&Utc)));
    }

    // Bare integers are unix seconds, as produced by the escrow contract.
    if let Ok(secs) = trimmed.parse::<i64>() {
      return Utc.timestamp_opt(secs, 0).single().map(Self::At).ok_or_else(invalid);
    }

    let mut parts = trimmed.split_whitespace();
    let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next())
    else {
      return Err(invalid());
    };
    let amount: u32 = amount.parse().map_err(|_| invalid())?;
    if amount == 0 {
      return Err(invalid());
    }
    let unit = DeadlineUnit::parse(unit).ok_or_else(invalid)?;
    Ok(Self::Relative { amount, unit })
  }
}

impl TryFrom<String> for Deadline {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Deadline> for String {
  fn from(d: Deadline) -> Self { d.to_string() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn parses_relative_labels() {
    assert_eq!("7 days".parse::<Deadline>().unwrap(), Deadline::days(7));
    assert_eq!("1 day".parse::<Deadline>().unwrap(), Deadline::days(1));
    assert_eq!(
      "2 Weeks".parse::<Deadline>().unwrap(),
      Deadline::Relative { amount: 2, unit: DeadlineUnit::Week }
    );
    assert_eq!(
      " 1 month ".parse::<Deadline>().unwrap(),
      Deadline::Relative { amount: 1, unit: DeadlineUnit::Month }
    );
  }

  #[test]
  fn parses_absolute_forms() {
    assert_eq!("1700000000".parse::<Deadline>().unwrap(), Deadline::At(at(1_700_000_000)));
    assert_eq!(
      "2024-01-01T00:00:00Z".parse::<Deadline>().unwrap(),
      Deadline::At(at(1_704_067_200))
    );
  }

  #[test]
  fn rejects_malformed_labels() {
    for bad in ["ASAP", "", "days", "0 days", "-1 days", "7 fortnights", "7 days later", "seven days"] {
      assert!(bad.parse::<Deadline>().is_err(), "{bad:?} should be rejected");
    }
  }

  #[test]
  fn canonical_text_round_trips() {
    let d: Deadline = "1 weeks".parse().unwrap();
    assert_eq!(d.to_string(), "1 week");
    assert_eq!(d.to_string().parse::<Deadline>().unwrap(), d);
    assert_eq!(Deadline::days(3).to_string(), "3 days");
    assert_eq!(
      Deadline::Relative { amount: 1, unit: DeadlineUnit::Month }.to_string(),
      "1 month"
    );
  }

  #[test]
  fn expiry_arithmetic() {
    let created = at(1_704_067_200); // 2024-01-01
    assert_eq!(Deadline::days(7).expires_at(created), Some(at(1_704_067_200 + 7 * 86_400)));
    assert_eq!(
      Deadline::Relative { amount: 2, unit: DeadlineUnit::Week }.expires_at(created),
      Some(at(1_704_067_200 + 14 * 86_400))
    );
    // January has 31 days.
    assert_eq!(
      Deadline::Relative { amount: 1, unit: DeadlineUnit::Month }.expires_at(created),
      Some(at(1_704_067_200 + 31 * 86_400))
    );
  }

  #[test]
  fn seven_day_deadline_passed_after_eight_days() {
    let created = at(1_704_067_200);
    let now = created + Duration::days(8);
    assert!(Deadline::days(7).has_passed(created, now));
    assert!(!Deadline::days(30).has_passed(created, now));
  }

  #[test]
  fn stored_text_that_fails_to_parse_is_kept() {
    assert_eq!(Deadline::from_stored("2 weeks".into()), "2 weeks".parse().unwrap());
    let legacy = Deadline::from_stored("ASAP".into());
    assert_eq!(legacy, Deadline::Unparsed("ASAP".into()));
    assert_eq!(legacy.to_string(), "ASAP");
    assert!(!legacy.has_passed(at(0), at(i64::from(u32::MAX))));
  }

  #[test]
  fn serde_uses_text_form() {
    let json = serde_json::to_string(&Deadline::days(3)).unwrap();
    assert_eq!(json, "\"3 days\"");
    let back: Deadline = serde_json::from_str("\"3 day\"").unwrap();
    assert_eq!(back, Deadline::days(3));
    assert!(serde_json::from_str::<Deadline>("\"ASAP\"").is_err());
  }
}
