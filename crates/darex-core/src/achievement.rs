//! The achievement rule table.
//!
//! Each rule reads one metric off a user's record and unlocks at a fixed
//! threshold. Rules are independent of each other.

use serde::Serialize;

use crate::user::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
  pub id:           &'static str,
  pub title:        &'static str,
  pub description:  &'static str,
  pub unlocked:     bool,
  pub progress:     i64,
  pub max_progress: i64,
}

struct Rule {
  id:          &'static str,
  title:       &'static str,
  description: &'static str,
  target:      i64,
  metric:      fn(&User, i64) -> i64,
}

const RULES: &[Rule] = &[
  Rule {
    id:          "first-dare",
    title:       "First Steps",
    description: "Complete your first dare",
    target:      1,
    metric:      |u, _| u.dares_completed,
  },
  Rule {
    id:          "dare-veteran",
    title:       "Dare Veteran",
    description: "Complete 5 dares",
    target:      5,
    metric:      |u, _| u.dares_completed,
  },
  Rule {
    id:          "creator",
    title:       "Challenger",
    description: "Create your first dare",
    target:      1,
    metric:      |u, _| u.dares_created,
  },
  Rule {
    id:          "voter",
    title:       "Community Voice",
    description: "Vote on 10 submissions",
    target:      10,
    metric:      |_, votes| votes,
  },
  Rule {
    id:          "earner",
    title:       "High Earner",
    description: "Earn 500 in rewards",
    target:      500,
    // Whole units; fractional earnings never unlock early.
    metric:      |u, _| u.total_earned.floor() as i64,
  },
  Rule {
    id:          "streak-3",
    title:       "On a Roll",
    description: "Reach a 3-dare streak",
    target:      3,
    metric:      |u, _| u.longest_streak,
  },
  Rule {
    id:          "streak-7",
    title:       "Unstoppable",
    description: "Reach a 7-dare streak",
    target:      7,
    metric:      |u, _| u.longest_streak,
  },
];

/// Evaluate every rule for `user`, who has cast `votes_cast` votes.
pub fn evaluate(user: &User, votes_cast: i64) -> Vec<Achievement> {
  RULES
    .iter()
    .map(|rule| {
      let value = (rule.metric)(user, votes_cast).max(0);
      Achievement {
        id:           rule.id,
        title:        rule.title,
        description:  rule.description,
        unlocked:     value >= rule.target,
        progress:     value.min(rule.target),
        max_progress: rule.target,
      }
    })
    .collect()
}
