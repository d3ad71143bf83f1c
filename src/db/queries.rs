//! Statement-level helpers over a borrowed connection.
//!
//! [`Database`](super::Database) methods lock the shared connection and call
//! into these; the batch importers call them with an open transaction so a
//! whole import commits or fails as one.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::*;

pub(crate) const TOPIC_COLUMNS: &str = "id, name, goal_questions, goal_minutes, description";

pub(crate) const PROBLEM_COLUMNS: &str = "id, title, source, link, difficulty, tags, notes, topic_id,
     first_logged_date, first_logged_minutes, needs_review, review_priority,
     next_review_date, review_notes, created_at";

pub(crate) const SESSION_COLUMNS: &str =
    "id, date, duration_minutes, attempts, outcome, notes, topic_id, problem_id";

pub(crate) const ATTEMPT_COLUMNS: &str =
    "id, problem_id, planned_date, minutes_spent, outcome, notes, created_at";

// ============================================================
// Row mapping
// ============================================================

pub(crate) fn map_topic(row: &Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        name: row.get(1)?,
        goal_questions: row.get(2)?,
        goal_minutes: row.get(3)?,
        description: row.get(4)?,
    })
}

pub(crate) fn map_problem(row: &Row) -> rusqlite::Result<Problem> {
    Ok(Problem {
        id: row.get(0)?,
        title: row.get(1)?,
        source: row.get(2)?,
        link: row.get(3)?,
        difficulty: row.get(4)?,
        tags: row.get(5)?,
        notes: row.get(6)?,
        topic_id: row.get(7)?,
        first_logged_date: row.get::<_, Option<String>>(8)?.and_then(parse_date),
        first_logged_minutes: row.get(9)?,
        needs_review: row.get::<_, i64>(10)? != 0,
        review_priority: ReviewPriority::from_str(&row.get::<_, String>(11)?)
            .unwrap_or(ReviewPriority::Normal),
        next_review_date: row.get::<_, Option<String>>(12)?.and_then(parse_date),
        review_notes: row.get(13)?,
        created_at: parse_datetime(row.get::<_, String>(14)?),
    })
}

pub(crate) fn map_session(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        date: row.get::<_, Option<String>>(1)?.and_then(parse_date),
        duration_minutes: row.get(2)?,
        attempts: row.get(3)?,
        outcome: row.get(4)?,
        notes: row.get(5)?,
        topic_id: row.get(6)?,
        problem_id: row.get(7)?,
    })
}

pub(crate) fn map_attempt(row: &Row) -> rusqlite::Result<ResolveAttempt> {
    Ok(ResolveAttempt {
        id: row.get(0)?,
        problem_id: row.get(1)?,
        planned_date: row.get::<_, Option<String>>(2)?.and_then(parse_date),
        minutes_spent: row.get(3)?,
        outcome: ResolveOutcome::from_str(&row.get::<_, String>(4)?)
            .unwrap_or(ResolveOutcome::Planned),
        notes: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

pub(crate) fn parse_date(s: String) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

pub(crate) fn parse_datetime(s: String) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Fixed-width RFC 3339 so stored timestamps sort as text.
pub(crate) fn format_datetime(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

// ============================================================
// Topics
// ============================================================

pub(crate) fn get_topic(conn: &Connection, id: i64) -> Result<Option<Topic>> {
    let topic = conn
        .query_row(
            &format!("SELECT {} FROM topics WHERE id = ?", TOPIC_COLUMNS),
            [id],
            map_topic,
        )
        .optional()?;
    Ok(topic)
}

/// Case-insensitive lookup.
pub(crate) fn find_topic_by_name(conn: &Connection, name: &str) -> Result<Option<Topic>> {
    let topic = conn
        .query_row(
            &format!(
                "SELECT {} FROM topics WHERE name = ? COLLATE NOCASE ORDER BY id LIMIT 1",
                TOPIC_COLUMNS
            ),
            [name],
            map_topic,
        )
        .optional()?;
    Ok(topic)
}

pub(crate) fn insert_topic(conn: &Connection, input: &NewTopic) -> Result<Topic> {
    conn.execute(
        "INSERT INTO topics (name, goal_questions, goal_minutes, description) VALUES (?, ?, ?, ?)",
        (
            &input.name,
            input.goal_questions,
            input.goal_minutes,
            &input.description,
        ),
    )?;

    Ok(Topic {
        id: conn.last_insert_rowid(),
        name: input.name.clone(),
        goal_questions: input.goal_questions,
        goal_minutes: input.goal_minutes,
        description: input.description.clone(),
    })
}

/// Resolve a topic by name, creating it when absent.
///
/// There is no lock between the lookup and the insert; the unique index on
/// `topics.name` is what rejects a concurrent duplicate, and that error is
/// returned to the caller.
pub(crate) fn topic_by_name_or_create(conn: &Connection, name: &str) -> Result<Topic> {
    if let Some(topic) = find_topic_by_name(conn, name)? {
        return Ok(topic);
    }
    tracing::debug!("Creating topic {:?}", name);
    insert_topic(conn, &NewTopic::named(name))
}

// ============================================================
// Problems
// ============================================================

pub(crate) fn get_problem(conn: &Connection, id: i64) -> Result<Option<Problem>> {
    let problem = conn
        .query_row(
            &format!("SELECT {} FROM problems WHERE id = ?", PROBLEM_COLUMNS),
            [id],
            map_problem,
        )
        .optional()?;
    Ok(problem)
}

/// Exact match on both title and link.
pub(crate) fn find_problem_by_title_link(
    conn: &Connection,
    title: &str,
    link: &str,
) -> Result<Option<Problem>> {
    let problem = conn
        .query_row(
            &format!(
                "SELECT {} FROM problems WHERE title = ? AND link = ? ORDER BY id LIMIT 1",
                PROBLEM_COLUMNS
            ),
            [title, link],
            map_problem,
        )
        .optional()?;
    Ok(problem)
}

/// Case-insensitive title match, oldest problem wins.
pub(crate) fn find_problem_by_title(conn: &Connection, title: &str) -> Result<Option<Problem>> {
    let problem = conn
        .query_row(
            &format!(
                "SELECT {} FROM problems WHERE title = ? COLLATE NOCASE ORDER BY id LIMIT 1",
                PROBLEM_COLUMNS
            ),
            [title],
            map_problem,
        )
        .optional()?;
    Ok(problem)
}

pub(crate) fn insert_problem(conn: &Connection, input: &NewProblem) -> Result<Problem> {
    let now = now();
    let first_logged_date = input.first_logged_date.unwrap_or_else(crate::today);

    conn.execute(
        "INSERT INTO problems (title, source, link, difficulty, tags, notes, topic_id,
             first_logged_date, first_logged_minutes, needs_review, review_priority,
             next_review_date, review_notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 'Normal', NULL, '', ?)",
        rusqlite::params![
            &input.title,
            &input.source,
            &input.link,
            &input.difficulty,
            &input.tags,
            &input.notes,
            input.topic_id,
            format_date(Some(first_logged_date)),
            input.first_logged_minutes,
            format_datetime(now),
        ],
    )?;

    Ok(Problem {
        id: conn.last_insert_rowid(),
        title: input.title.clone(),
        source: input.source.clone(),
        link: input.link.clone(),
        difficulty: input.difficulty.clone(),
        tags: input.tags.clone(),
        notes: input.notes.clone(),
        topic_id: input.topic_id,
        first_logged_date: Some(first_logged_date),
        first_logged_minutes: input.first_logged_minutes,
        needs_review: false,
        review_priority: ReviewPriority::Normal,
        next_review_date: None,
        review_notes: String::new(),
        created_at: now,
    })
}

// ============================================================
// Sessions and attempts
// ============================================================

pub(crate) fn insert_session(conn: &Connection, input: &NewSession) -> Result<Session> {
    conn.execute(
        "INSERT INTO sessions (date, duration_minutes, attempts, outcome, notes, topic_id, problem_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            format_date(input.date),
            input.duration_minutes,
            input.attempts,
            &input.outcome,
            &input.notes,
            input.topic_id,
            input.problem_id,
        ),
    )?;

    Ok(Session {
        id: conn.last_insert_rowid(),
        date: input.date,
        duration_minutes: input.duration_minutes,
        attempts: input.attempts,
        outcome: input.outcome.clone(),
        notes: input.notes.clone(),
        topic_id: input.topic_id,
        problem_id: input.problem_id,
    })
}

pub(crate) fn insert_attempt(conn: &Connection, input: &NewResolveAttempt) -> Result<ResolveAttempt> {
    let now = now();

    conn.execute(
        "INSERT INTO resolve_attempts (problem_id, planned_date, minutes_spent, outcome, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            input.problem_id,
            format_date(input.planned_date),
            input.minutes_spent,
            input.outcome.as_str(),
            &input.notes,
            format_datetime(now),
        ),
    )?;

    Ok(ResolveAttempt {
        id: conn.last_insert_rowid(),
        problem_id: input.problem_id,
        planned_date: input.planned_date,
        minutes_spent: input.minutes_spent,
        outcome: input.outcome,
        notes: input.notes.clone(),
        created_at: now,
    })
}

pub(crate) fn get_attempt(conn: &Connection, id: i64) -> Result<Option<ResolveAttempt>> {
    let attempt = conn
        .query_row(
            &format!("SELECT {} FROM resolve_attempts WHERE id = ?", ATTEMPT_COLUMNS),
            [id],
            map_attempt,
        )
        .optional()?;
    Ok(attempt)
}
