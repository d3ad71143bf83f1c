use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries::{find_problem_by_title, insert_problem, insert_session, topic_by_name_or_create};
use crate::error::TrackerError;
use crate::models::{NewProblem, NewSession};

/// One parsed `date|topic|title|minutes|outcome|notes` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    pub date: NaiveDate,
    pub topic: Option<String>,
    pub title: Option<String>,
    pub minutes: i64,
    pub outcome: String,
    pub notes: String,
}

/// Parse one bulk line. Lines with fewer than four fields are skipped.
///
/// A missing or malformed date becomes `today`; minutes must be plain
/// digits or they count as zero. The outcome is "Solved" only when the
/// field is absent altogether.
pub fn parse_session_line(line: &str, today: NaiveDate) -> Option<SessionLine> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() < 4 {
        return None;
    }

    let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d").unwrap_or(today);
    let minutes = if !parts[3].is_empty() && parts[3].chars().all(|c| c.is_ascii_digit()) {
        parts[3].parse().unwrap_or(0)
    } else {
        0
    };

    Some(SessionLine {
        date,
        topic: non_empty(parts[1]),
        title: non_empty(parts[2]),
        minutes,
        outcome: parts.get(4).copied().unwrap_or("Solved").to_string(),
        notes: parts.get(5).copied().unwrap_or("").to_string(),
    })
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Create one session per parsable line, resolving topics and problems by
/// name (case-insensitive) and creating the missing ones.
pub fn import_session_lines(conn: &Connection, text: &str, today: NaiveDate) -> Result<usize> {
    if text.trim().is_empty() {
        return Err(TrackerError::invalid("No data provided").into());
    }

    let mut imported = 0;
    for line in text.lines() {
        let Some(entry) = parse_session_line(line, today) else {
            continue;
        };

        let topic = match &entry.topic {
            Some(name) => Some(topic_by_name_or_create(conn, name)?),
            None => None,
        };
        let topic_id = topic.map(|t| t.id);

        let problem = match &entry.title {
            Some(title) => match find_problem_by_title(conn, title)? {
                Some(problem) => Some(problem),
                None => Some(insert_problem(
                    conn,
                    &NewProblem {
                        topic_id,
                        ..NewProblem::titled(title.as_str())
                    },
                )?),
            },
            None => None,
        };

        insert_session(
            conn,
            &NewSession {
                date: Some(entry.date),
                duration_minutes: entry.minutes,
                outcome: entry.outcome,
                notes: entry.notes,
                topic_id: topic_id.or(problem.as_ref().and_then(|p| p.topic_id)),
                problem_id: problem.as_ref().map(|p| p.id),
                ..NewSession::default()
            },
        )?;
        imported += 1;
    }
    Ok(imported)
}
