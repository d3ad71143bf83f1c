use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One logged practice block.
///
/// The outcome is a free label ("Solved", "Stuck", ...) and unrelated to
/// [`ResolveOutcome`](super::ResolveOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub date: Option<NaiveDate>,
    pub duration_minutes: i64,
    pub attempts: i64,
    pub outcome: String,
    pub notes: String,
    pub topic_id: Option<i64>,
    pub problem_id: Option<i64>,
}

/// Input for logging a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub date: Option<NaiveDate>,
    pub duration_minutes: i64,
    pub attempts: i64,
    pub outcome: String,
    pub notes: String,
    pub topic_id: Option<i64>,
    pub problem_id: Option<i64>,
}

impl Default for NewSession {
    fn default() -> Self {
        Self {
            date: None,
            duration_minutes: 0,
            attempts: 1,
            outcome: "Solved".to_string(),
            notes: String::new(),
            topic_id: None,
            problem_id: None,
        }
    }
}

/// A session joined with the names it links to, used for listings and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub topic_name: Option<String>,
    pub problem_title: Option<String>,
}

/// Sum/count/max over all sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_minutes: i64,
    pub total_sessions: i64,
    pub latest_date: Option<NaiveDate>,
}
