//! Raw user input and its conversion into model inputs.
//!
//! Request bodies and CLI arguments arrive as loosely typed text. Each form
//! here accepts strings or numbers for every field and converts to the typed
//! inputs of [`crate::models`], applying the recovery rules of the tracker:
//! malformed dates fall back to today and malformed numbers to zero, while a
//! missing required field rejects the whole request.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TrackerError;
use crate::models::*;

/// Accept any JSON scalar as text; `null` and absent fields become `None`.
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn trimmed(raw: &Option<String>) -> &str {
    raw.as_deref().map(str::trim).unwrap_or("")
}

fn text(raw: &Option<String>) -> String {
    trimmed(raw).to_string()
}

fn iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn int(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// An id field: empty or non-numeric means "none".
fn id(raw: &Option<String>) -> Option<i64> {
    int(trimmed(raw))
}

/// Strict `YYYY-MM-DD`, else `today`.
fn date_or_today(raw: &Option<String>, today: NaiveDate) -> NaiveDate {
    iso_date(trimmed(raw)).unwrap_or(today)
}

/// Whole number, else zero.
fn int_or_zero(raw: &Option<String>) -> i64 {
    int(trimmed(raw)).unwrap_or(0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicForm {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub goal_questions: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub goal_minutes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

impl TopicForm {
    pub fn into_new(self) -> Result<NewTopic, TrackerError> {
        let name = text(&self.name);
        if name.is_empty() {
            return Err(TrackerError::invalid("Topic name required"));
        }
        Ok(NewTopic {
            name,
            goal_questions: int_or_zero(&self.goal_questions),
            goal_minutes: int_or_zero(&self.goal_minutes),
            description: text(&self.description),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemForm {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub topic_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_logged_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub first_logged_minutes: Option<String>,
}

impl ProblemForm {
    pub fn into_new(self, today: NaiveDate) -> Result<NewProblem, TrackerError> {
        let title = text(&self.title);
        if title.is_empty() {
            return Err(TrackerError::invalid("Title is required"));
        }
        Ok(NewProblem {
            title,
            link: text(&self.link),
            source: self
                .source
                .as_deref()
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| "LeetCode".to_string()),
            difficulty: text(&self.difficulty),
            tags: text(&self.tags),
            notes: text(&self.notes),
            topic_id: id(&self.topic_id),
            first_logged_date: Some(date_or_today(&self.first_logged_date, today)),
            first_logged_minutes: int_or_zero(&self.first_logged_minutes),
        })
    }

    /// Edits replace the text fields wholesale. A blank title keeps the old
    /// one. `first_logged_date`: absent keeps, blank clears, malformed keeps.
    /// `first_logged_minutes`: absent keeps, blank resets to zero, malformed keeps.
    pub fn into_edit(self) -> ProblemEdit {
        let title = text(&self.title);
        ProblemEdit {
            title: (!title.is_empty()).then_some(title),
            source: text(&self.source),
            link: text(&self.link),
            difficulty: text(&self.difficulty),
            tags: text(&self.tags),
            notes: text(&self.notes),
            topic_id: id(&self.topic_id),
            first_logged_date: self.first_logged_date.as_deref().map(str::trim).and_then(|raw| {
                if raw.is_empty() {
                    Some(None)
                } else {
                    iso_date(raw).map(Some)
                }
            }),
            first_logged_minutes: self
                .first_logged_minutes
                .as_deref()
                .map(str::trim)
                .and_then(|raw| if raw.is_empty() { Some(0) } else { int(raw) }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionForm {
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub duration_minutes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub attempts: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub topic_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub problem_id: Option<String>,
}

impl SessionForm {
    pub fn into_new(self, today: NaiveDate) -> NewSession {
        NewSession {
            date: Some(date_or_today(&self.date, today)),
            duration_minutes: int_or_zero(&self.duration_minutes),
            attempts: int(trimmed(&self.attempts)).unwrap_or(1),
            outcome: self
                .outcome
                .as_deref()
                .map(str::trim)
                .unwrap_or("Solved")
                .to_string(),
            notes: text(&self.notes),
            topic_id: id(&self.topic_id),
            problem_id: id(&self.problem_id),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveForm {
    #[serde(default, deserialize_with = "lenient")]
    pub problem_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub planned_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub minutes_spent: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
}

impl ResolveForm {
    /// Unknown outcomes are logged as `Planned`.
    pub fn into_new(self, today: NaiveDate) -> Result<NewResolveAttempt, TrackerError> {
        let problem_id = id(&self.problem_id)
            .ok_or_else(|| TrackerError::invalid("Select a problem to track a resolve attempt"))?;
        Ok(NewResolveAttempt {
            problem_id,
            planned_date: Some(date_or_today(&self.planned_date, today)),
            minutes_spent: Some(int_or_zero(&self.minutes_spent)),
            outcome: ResolveOutcome::from_str(trimmed(&self.outcome)).unwrap_or_default(),
            notes: text(&self.notes),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeForm {
    #[serde(default, deserialize_with = "lenient")]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub minutes_spent: Option<String>,
}

impl OutcomeForm {
    /// Unlike new attempts, an unknown outcome rejects the update.
    /// Blank or malformed minutes keep the stored value.
    pub fn into_update(self) -> Result<OutcomeUpdate, TrackerError> {
        let outcome = ResolveOutcome::from_str(trimmed(&self.outcome))
            .ok_or_else(|| TrackerError::invalid("Invalid outcome"))?;
        Ok(OutcomeUpdate {
            outcome,
            minutes_spent: int(trimmed(&self.minutes_spent)),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewForm {
    /// `"on"` / `"off"`; takes precedence over `needs_review`.
    #[serde(default, deserialize_with = "lenient")]
    pub review_state: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub needs_review: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub review_priority: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub review_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub next_review_date: Option<String>,
}

impl ReviewForm {
    pub fn into_update(self) -> Result<ReviewUpdate, TrackerError> {
        let needs_review = match self.review_state.as_deref() {
            Some("on") => Some(true),
            Some("off") => Some(false),
            _ => self
                .needs_review
                .as_deref()
                .map(|v| matches!(v.trim(), "true" | "1" | "on")),
        };

        let review_priority = match self.review_priority.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(ReviewPriority::Normal),
            Some(raw) => Some(
                ReviewPriority::from_str(raw)
                    .ok_or_else(|| TrackerError::invalid("Invalid review priority"))?,
            ),
        };

        let next_review_date = match self.next_review_date.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(raw) => match iso_date(raw) {
                Some(date) => Some(Some(date)),
                None => {
                    tracing::warn!("Invalid next review date {:?}, keeping current value", raw);
                    None
                }
            },
        };

        Ok(ReviewUpdate {
            needs_review,
            review_priority,
            review_notes: self.review_notes.as_deref().map(|s| s.trim().to_string()),
            next_review_date,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkForm {
    #[serde(default)]
    pub bulk: String,
}
