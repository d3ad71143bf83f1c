use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A spaced-repetition attempt at re-solving a logged problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveAttempt {
    pub id: i64,
    pub problem_id: i64,
    /// Day the attempt was planned or made. Undated attempts order first.
    pub planned_date: Option<NaiveDate>,
    /// `None` is "not recorded" and is never counted as zero.
    pub minutes_spent: Option<i64>,
    pub outcome: ResolveOutcome,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a resolve attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolveOutcome {
    #[default]
    Planned,
    Solved,
    #[serde(rename = "Not Solved")]
    NotSolved,
}

impl ResolveOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::Solved => "Solved",
            Self::NotSolved => "Not Solved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Planned" => Some(Self::Planned),
            "Solved" => Some(Self::Solved),
            "Not Solved" => Some(Self::NotSolved),
            _ => None,
        }
    }
}

/// Input for logging a resolve attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResolveAttempt {
    pub problem_id: i64,
    pub planned_date: Option<NaiveDate>,
    pub minutes_spent: Option<i64>,
    pub outcome: ResolveOutcome,
    pub notes: String,
}

/// Outcome change on an existing attempt. `minutes_spent: None` keeps the old value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeUpdate {
    pub outcome: ResolveOutcome,
    pub minutes_spent: Option<i64>,
}
