use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A practice problem.
///
/// `first_logged_date` / `first_logged_minutes` record the first time the
/// problem was attempted; they are seeded from the creation day when not given.
/// The review fields are set by the user only, nothing escalates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub title: String,
    pub source: String,
    pub link: String,
    pub difficulty: String,
    pub tags: String,
    pub notes: String,
    pub topic_id: Option<i64>,
    pub first_logged_date: Option<NaiveDate>,
    pub first_logged_minutes: i64,
    pub needs_review: bool,
    pub review_priority: ReviewPriority,
    pub next_review_date: Option<NaiveDate>,
    pub review_notes: String,
    pub created_at: DateTime<Utc>,
}

/// How urgently a problem flagged for review should be revisited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReviewPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl ReviewPriority {
    pub const ALL: [ReviewPriority; 4] = [Self::Low, Self::Normal, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Normal" => Some(Self::Normal),
            "High" => Some(Self::High),
            "Critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Input for creating a problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProblem {
    pub title: String,
    pub source: String,
    pub link: String,
    pub difficulty: String,
    pub tags: String,
    pub notes: String,
    pub topic_id: Option<i64>,
    /// Defaults to the creation day when `None`.
    pub first_logged_date: Option<NaiveDate>,
    pub first_logged_minutes: i64,
}

impl NewProblem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: "LeetCode".to_string(),
            link: String::new(),
            difficulty: String::new(),
            tags: String::new(),
            notes: String::new(),
            topic_id: None,
            first_logged_date: None,
            first_logged_minutes: 0,
        }
    }
}

/// Edit of an existing problem.
///
/// Text fields and the topic are always replaced. `title` is only replaced
/// when present; `first_logged_*` follow "outer `None` means unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemEdit {
    pub title: Option<String>,
    pub source: String,
    pub link: String,
    pub difficulty: String,
    pub tags: String,
    pub notes: String,
    pub topic_id: Option<i64>,
    pub first_logged_date: Option<Option<NaiveDate>>,
    pub first_logged_minutes: Option<i64>,
}

/// Partial update of a problem's review settings. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub needs_review: Option<bool>,
    pub review_priority: Option<ReviewPriority>,
    pub review_notes: Option<String>,
    pub next_review_date: Option<Option<NaiveDate>>,
}

/// Filter for problem listings. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct ProblemFilter {
    pub topic_id: Option<i64>,
    pub needs_review: Option<bool>,
    pub limit: Option<usize>,
}
