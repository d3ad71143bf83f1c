//! Read-only page models assembled from the store and the progress aggregator.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::*;
use crate::progress::{self, HistoryEntry, ResolveSummary};

const OVERVIEW_LIMIT: usize = 500;
const RECENT_ATTEMPTS_LIMIT: usize = 400;
const REVIEW_PREVIEW: usize = 5;
const TOP_TOPICS: usize = 10;
const UNASSIGNED_GROUP: &str = "Misc / No Topic";

// ============================================================
// Statistics
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub name: String,
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMinutes {
    pub name: String,
    pub minutes: i64,
}

/// One bar of the weekly chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLabel {
    pub label: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub totals: SessionTotals,
    /// Sessions in the last seven days (undated ones included).
    pub recent_topic_counts: Vec<TopicCount>,
    pub top_topics: Vec<TopicMinutes>,
    pub last_week: Vec<DayLabel>,
}

impl Dashboard {
    pub fn load(db: &Database, today: NaiveDate) -> Result<Self> {
        let week_start = today - Duration::days(6);

        let recent_topic_counts = db
            .get_topic_session_counts_since(week_start)?
            .into_iter()
            .map(|(name, sessions)| TopicCount { name, sessions })
            .collect();
        let top_topics = db
            .get_top_topics_by_minutes(TOP_TOPICS)?
            .into_iter()
            .map(|(name, minutes)| TopicMinutes { name, minutes })
            .collect();

        let by_day = db.get_minutes_by_day(week_start, today)?;
        let last_week = days(week_start, today)
            .map(|day| DayLabel {
                label: day.format("%d %b").to_string(),
                minutes: by_day.get(&day).copied().unwrap_or(0),
            })
            .collect();

        Ok(Self {
            totals: db.get_session_totals()?,
            recent_topic_counts,
            top_topics,
            last_week,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMinutes {
    pub date: NaiveDate,
    pub minutes: i64,
}

/// Daily minutes for the 30 days ending today, zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySeries {
    pub series: Vec<DayMinutes>,
}

impl DailySeries {
    pub fn load(db: &Database, today: NaiveDate) -> Result<Self> {
        let start = today - Duration::days(29);
        let by_day = db.get_minutes_by_day(start, today)?;
        let series = days(start, today)
            .map(|date| DayMinutes {
                date,
                minutes: by_day.get(&date).copied().unwrap_or(0),
            })
            .collect();
        Ok(Self { series })
    }
}

fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

/// A topic with its session count and total minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRow {
    #[serde(flatten)]
    pub topic: Topic,
    pub sessions: i64,
    pub minutes: i64,
}

pub fn topic_table(db: &Database) -> Result<Vec<TopicRow>> {
    Ok(db
        .get_topic_totals()?
        .into_iter()
        .map(|(topic, sessions, minutes)| TopicRow {
            topic,
            sessions,
            minutes,
        })
        .collect())
}

// ============================================================
// Problems
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRow {
    #[serde(flatten)]
    pub problem: Problem,
    pub topic_name: Option<String>,
    pub resolve: ResolveSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemGroup {
    pub topic_id: Option<i64>,
    pub name: String,
    pub problems: Vec<ProblemRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemTotals {
    pub total: usize,
    pub needs_review: usize,
    /// Solved attempts planned on or after the day a week before today.
    pub recent_solves: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemsOverview {
    pub groups: Vec<ProblemGroup>,
    pub totals: ProblemTotals,
    pub review_preview: Vec<Problem>,
}

impl ProblemsOverview {
    pub fn load(db: &Database, today: NaiveDate) -> Result<Self> {
        let problems = db.list_problems(&ProblemFilter {
            limit: Some(OVERVIEW_LIMIT),
            ..ProblemFilter::default()
        })?;
        let topics = db.get_all_topics()?;
        let attempts = progress::group_by_problem(db.list_all_attempts()?);

        let totals = ProblemTotals {
            total: problems.len(),
            needs_review: problems.iter().filter(|p| p.needs_review).count(),
            recent_solves: db.count_solved_attempts_since(today - Duration::days(7))?,
        };
        let review_preview = progress::review_queue(&problems)
            .into_iter()
            .take(REVIEW_PREVIEW)
            .collect();
        let rows = problem_rows(&problems, &topics, &attempts);

        Ok(Self {
            groups: group_rows(rows, &topics),
            totals,
            review_preview,
        })
    }
}

fn problem_rows(
    problems: &[Problem],
    topics: &[Topic],
    attempts: &HashMap<i64, Vec<ResolveAttempt>>,
) -> Vec<ProblemRow> {
    let names: HashMap<i64, &str> = topics.iter().map(|t| (t.id, t.name.as_str())).collect();
    problems
        .iter()
        .map(|problem| ProblemRow {
            topic_name: problem
                .topic_id
                .and_then(|id| names.get(&id))
                .map(|name| name.to_string()),
            resolve: attempts
                .get(&problem.id)
                .map(|a| ResolveSummary::from_attempts(a))
                .unwrap_or_default(),
            problem: problem.clone(),
        })
        .collect()
}

/// Groups follow `topics` order (by name); rows keep their listing order.
/// Problems without a known topic land in a trailing catch-all group.
fn group_rows(rows: Vec<ProblemRow>, topics: &[Topic]) -> Vec<ProblemGroup> {
    let mut by_topic: HashMap<i64, Vec<ProblemRow>> = HashMap::new();
    let mut unassigned = Vec::new();
    for row in rows {
        match (row.problem.topic_id, &row.topic_name) {
            (Some(id), Some(_)) => by_topic.entry(id).or_default().push(row),
            _ => unassigned.push(row),
        }
    }

    let mut groups: Vec<ProblemGroup> = topics
        .iter()
        .filter_map(|topic| {
            by_topic.remove(&topic.id).map(|problems| ProblemGroup {
                topic_id: Some(topic.id),
                name: topic.name.clone(),
                problems,
            })
        })
        .collect();
    if !unassigned.is_empty() {
        groups.push(ProblemGroup {
            topic_id: None,
            name: UNASSIGNED_GROUP.to_string(),
            problems: unassigned,
        });
    }
    groups
}

// ============================================================
// Reviews
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRow {
    #[serde(flatten)]
    pub attempt: ResolveAttempt,
    pub problem_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewsBoard {
    pub problems: Vec<ProblemRow>,
    pub review_queue: Vec<Problem>,
    pub recent_attempts: Vec<AttemptRow>,
    pub history: Vec<HistoryEntry>,
    pub priorities: Vec<ReviewPriority>,
    /// Set when the board was opened for one problem that exists.
    pub focus: Option<Problem>,
}

impl ReviewsBoard {
    pub fn load(db: &Database, focus: Option<i64>) -> Result<Self> {
        let problems = db.list_problems(&ProblemFilter::default())?;
        let topics = db.get_all_topics()?;
        let attempts = progress::group_by_problem(db.list_all_attempts()?);

        let titles: HashMap<i64, &str> =
            problems.iter().map(|p| (p.id, p.title.as_str())).collect();
        let recent_attempts = db
            .list_recent_attempts(RECENT_ATTEMPTS_LIMIT)?
            .into_iter()
            .map(|attempt| AttemptRow {
                problem_title: titles
                    .get(&attempt.problem_id)
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                attempt,
            })
            .collect();

        let focus = match focus {
            Some(id) => db.get_problem(id)?,
            None => None,
        };

        Ok(Self {
            review_queue: progress::review_queue(&problems),
            history: progress::resolve_history(&problems, &attempts),
            problems: problem_rows(&problems, &topics, &attempts),
            recent_attempts,
            priorities: ReviewPriority::ALL.to_vec(),
            focus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn series_are_zero_filled() {
        let db = seeded();
        let today = date(2024, 3, 10);
        db.create_session(NewSession {
            date: Some(date(2024, 3, 9)),
            duration_minutes: 40,
            ..NewSession::default()
        })
        .unwrap();

        let series = DailySeries::load(&db, today).unwrap().series;
        assert_eq!(series.len(), 30);
        assert_eq!(series.first().unwrap().date, date(2024, 2, 10));
        assert_eq!(series.last().unwrap().date, today);
        assert_eq!(series[28].minutes, 40);
        assert_eq!(series.iter().map(|d| d.minutes).sum::<i64>(), 40);

        let dashboard = Dashboard::load(&db, today).unwrap();
        assert_eq!(dashboard.last_week.len(), 7);
        assert_eq!(dashboard.last_week[0].label, "04 Mar");
        assert_eq!(dashboard.last_week[5].minutes, 40);
        assert_eq!(dashboard.totals.total_minutes, 40);
    }

    #[test]
    fn overview_groups_by_topic_with_catch_all_last() {
        let db = seeded();
        let graphs = db.create_topic(NewTopic::named("Graphs")).unwrap();
        let arrays = db.create_topic(NewTopic::named("Arrays")).unwrap();
        db.create_problem(NewProblem {
            topic_id: Some(graphs.id),
            ..NewProblem::titled("Course Schedule")
        })
        .unwrap();
        db.create_problem(NewProblem::titled("Loose End")).unwrap();
        db.create_problem(NewProblem {
            topic_id: Some(arrays.id),
            ..NewProblem::titled("Two Sum")
        })
        .unwrap();

        let overview = ProblemsOverview::load(&db, date(2024, 3, 10)).unwrap();
        let names: Vec<&str> = overview.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Arrays", "Graphs", "Misc / No Topic"]);
        assert_eq!(overview.totals.total, 3);
        assert_eq!(overview.groups[0].problems[0].topic_name.as_deref(), Some("Arrays"));
    }

    #[test]
    fn recent_solves_include_the_day_a_week_ago() {
        let db = seeded();
        let problem = db.create_problem(NewProblem::titled("Two Sum")).unwrap();
        for (day, outcome) in [
            (2, ResolveOutcome::Solved),
            (3, ResolveOutcome::Solved),
            (9, ResolveOutcome::Planned),
        ] {
            db.create_attempt(NewResolveAttempt {
                problem_id: problem.id,
                planned_date: Some(date(2024, 3, day)),
                minutes_spent: Some(10),
                outcome,
                notes: String::new(),
            })
            .unwrap();
        }

        let overview = ProblemsOverview::load(&db, date(2024, 3, 10)).unwrap();
        assert_eq!(overview.totals.recent_solves, 1);
    }

    #[test]
    fn board_focus_ignores_unknown_problem() {
        let db = seeded();
        let board = ReviewsBoard::load(&db, Some(99)).unwrap();
        assert!(board.focus.is_none());
        assert_eq!(board.priorities.len(), 4);
    }
}
