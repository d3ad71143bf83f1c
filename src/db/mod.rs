pub(crate) mod queries;
mod schema;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::error::TrackerError;
use crate::import::{self, Sheet};
use crate::models::*;

use queries::*;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "dsa-tracker")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("dsa_tracker.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    /// One-time initialization: fill in the default topic list when no topic
    /// exists yet. Returns the number of topics created.
    pub fn seed_defaults(&self) -> Result<usize> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM topics", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        for name in DEFAULT_TOPICS {
            insert_topic(&tx, &NewTopic::named(*name))?;
        }
        tx.commit()?;

        tracing::info!("Seeded {} default topics", DEFAULT_TOPICS.len());
        Ok(DEFAULT_TOPICS.len())
    }

    // ============================================================
    // Topic operations
    // ============================================================

    pub fn get_all_topics(&self) -> Result<Vec<Topic>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!("SELECT {} FROM topics ORDER BY name", TOPIC_COLUMNS))?;
        let topics = stmt
            .query_map([], map_topic)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(topics)
    }

    pub fn get_topic(&self, id: i64) -> Result<Option<Topic>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        get_topic(&conn, id)
    }

    pub fn find_topic_by_name(&self, name: &str) -> Result<Option<Topic>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        find_topic_by_name(&conn, name)
    }

    /// Create a topic, refusing names that already exist in any letter case.
    pub fn create_topic(&self, input: NewTopic) -> Result<Topic> {
        let conn = self.conn.lock().expect("database lock poisoned");
        if find_topic_by_name(&conn, &input.name)?.is_some() {
            return Err(TrackerError::Conflict("Topic already exists".to_string()).into());
        }
        insert_topic(&conn, &input)
    }

    /// Deletes the topic together with its problems and sessions.
    pub fn delete_topic(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM topics WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    /// Per topic: number of sessions and total minutes, ordered by name.
    pub fn get_topic_totals(&self) -> Result<Vec<(Topic, i64, i64)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.goal_questions, t.goal_minutes, t.description,
                    COUNT(s.id), COALESCE(SUM(s.duration_minutes), 0)
             FROM topics t LEFT JOIN sessions s ON s.topic_id = t.id
             GROUP BY t.id ORDER BY t.name",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((map_topic(row)?, row.get(5)?, row.get(6)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Session counts per topic, counting sessions dated on or after `since`
    /// or undated. Topics without any session are listed with zero; topics
    /// whose sessions are all older drop out.
    pub fn get_topic_session_counts_since(&self, since: NaiveDate) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT t.name, COUNT(s.id)
             FROM topics t LEFT JOIN sessions s ON s.topic_id = t.id
             WHERE s.date >= ? OR s.date IS NULL
             GROUP BY t.id ORDER BY t.name",
        )?;
        let rows = stmt
            .query_map([format_date(Some(since))], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Topics ranked by total session minutes.
    pub fn get_top_topics_by_minutes(&self, limit: usize) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT t.name, COALESCE(SUM(s.duration_minutes), 0)
             FROM topics t LEFT JOIN sessions s ON s.topic_id = t.id
             GROUP BY t.id ORDER BY SUM(s.duration_minutes) DESC, t.name LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ============================================================
    // Problem operations
    // ============================================================

    /// Problems newest first, optionally narrowed by topic or review flag.
    pub fn list_problems(&self, filter: &ProblemFilter) -> Result<Vec<Problem>> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(topic_id) = filter.topic_id {
            clauses.push("topic_id = ?");
            params.push(Box::new(topic_id));
        }
        if let Some(needs_review) = filter.needs_review {
            clauses.push("needs_review = ?");
            params.push(Box::new(needs_review as i64));
        }

        let mut sql = format!("SELECT {} FROM problems", PROBLEM_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let problems = stmt
            .query_map(params_ref.as_slice(), map_problem)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(problems)
    }

    pub fn get_problem(&self, id: i64) -> Result<Option<Problem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        get_problem(&conn, id)
    }

    pub fn create_problem(&self, input: NewProblem) -> Result<Problem> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let input = NewProblem {
            topic_id: existing_topic(&conn, input.topic_id)?,
            ..input
        };
        insert_problem(&conn, &input)
    }

    pub fn update_problem(&self, id: i64, input: ProblemEdit) -> Result<Option<Problem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = get_problem(&conn, id)? else {
            return Ok(None);
        };

        let updated = Problem {
            title: input.title.unwrap_or(existing.title.clone()),
            source: input.source,
            link: input.link,
            difficulty: input.difficulty,
            tags: input.tags,
            notes: input.notes,
            topic_id: existing_topic(&conn, input.topic_id)?,
            first_logged_date: input.first_logged_date.unwrap_or(existing.first_logged_date),
            first_logged_minutes: input
                .first_logged_minutes
                .unwrap_or(existing.first_logged_minutes),
            ..existing
        };

        conn.execute(
            "UPDATE problems SET title = ?, source = ?, link = ?, difficulty = ?, tags = ?, notes = ?,
                 topic_id = ?, first_logged_date = ?, first_logged_minutes = ?
             WHERE id = ?",
            rusqlite::params![
                &updated.title,
                &updated.source,
                &updated.link,
                &updated.difficulty,
                &updated.tags,
                &updated.notes,
                updated.topic_id,
                format_date(updated.first_logged_date),
                updated.first_logged_minutes,
                id,
            ],
        )?;

        Ok(Some(updated))
    }

    pub fn update_review(&self, id: i64, input: ReviewUpdate) -> Result<Option<Problem>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = get_problem(&conn, id)? else {
            return Ok(None);
        };

        let updated = Problem {
            needs_review: input.needs_review.unwrap_or(existing.needs_review),
            review_priority: input.review_priority.unwrap_or(existing.review_priority),
            review_notes: input.review_notes.unwrap_or(existing.review_notes.clone()),
            next_review_date: input.next_review_date.unwrap_or(existing.next_review_date),
            ..existing
        };

        conn.execute(
            "UPDATE problems SET needs_review = ?, review_priority = ?, review_notes = ?, next_review_date = ?
             WHERE id = ?",
            (
                updated.needs_review as i64,
                updated.review_priority.as_str(),
                &updated.review_notes,
                format_date(updated.next_review_date),
                id,
            ),
        )?;

        Ok(Some(updated))
    }

    /// Deletes the problem and its resolve attempts; sessions keep their row
    /// but lose the link.
    pub fn delete_problem(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM problems WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Session operations
    // ============================================================

    pub fn create_session(&self, input: NewSession) -> Result<Session> {
        let conn = self.conn.lock().expect("database lock poisoned");
        if let Some(topic_id) = input.topic_id {
            get_topic(&conn, topic_id)?.ok_or(TrackerError::NotFound("Topic"))?;
        }
        if let Some(problem_id) = input.problem_id {
            get_problem(&conn, problem_id)?.ok_or(TrackerError::NotFound("Problem"))?;
        }
        insert_session(&conn, &input)
    }

    pub fn delete_session(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM sessions WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    pub fn get_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sessions ORDER BY date DESC, id DESC",
            SESSION_COLUMNS
        ))?;
        let sessions = stmt
            .query_map([], map_session)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Sessions with their topic and problem names, newest date first.
    pub fn get_session_details(&self, limit: Option<usize>) -> Result<Vec<SessionDetail>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT s.id, s.date, s.duration_minutes, s.attempts, s.outcome, s.notes,
                    s.topic_id, s.problem_id, t.name, p.title
             FROM sessions s
             LEFT JOIN topics t ON t.id = s.topic_id
             LEFT JOIN problems p ON p.id = s.problem_id
             ORDER BY s.date DESC, s.id DESC
             LIMIT ?",
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let sessions = stmt
            .query_map([limit], |row| {
                Ok(SessionDetail {
                    session: map_session(row)?,
                    topic_name: row.get(8)?,
                    problem_title: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    pub fn get_session_totals(&self) -> Result<SessionTotals> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let totals = conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0), COUNT(id), MAX(date) FROM sessions",
            [],
            |row| {
                Ok(SessionTotals {
                    total_minutes: row.get(0)?,
                    total_sessions: row.get(1)?,
                    latest_date: row.get::<_, Option<String>>(2)?.and_then(parse_date),
                })
            },
        )?;
        Ok(totals)
    }

    /// Minutes per day for sessions dated within `from..=to`. Days without
    /// sessions are absent.
    pub fn get_minutes_by_day(&self, from: NaiveDate, to: NaiveDate) -> Result<HashMap<NaiveDate, i64>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT date, COALESCE(SUM(duration_minutes), 0) FROM sessions
             WHERE date >= ? AND date <= ? GROUP BY date",
        )?;
        let rows = stmt
            .query_map([format_date(Some(from)), format_date(Some(to))], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(date, minutes)| parse_date(date).map(|d| (d, minutes)))
            .collect())
    }

    // ============================================================
    // Resolve attempt operations
    // ============================================================

    /// Attempts of one problem in storage order; callers sort with
    /// [`crate::progress`].
    pub fn list_attempts(&self, problem_id: i64) -> Result<Vec<ResolveAttempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resolve_attempts WHERE problem_id = ? ORDER BY id",
            ATTEMPT_COLUMNS
        ))?;
        let attempts = stmt
            .query_map([problem_id], map_attempt)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attempts)
    }

    pub fn list_all_attempts(&self) -> Result<Vec<ResolveAttempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resolve_attempts ORDER BY id",
            ATTEMPT_COLUMNS
        ))?;
        let attempts = stmt
            .query_map([], map_attempt)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attempts)
    }

    /// Most recent attempts across all problems, by planned date then creation time.
    pub fn list_recent_attempts(&self, limit: usize) -> Result<Vec<ResolveAttempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resolve_attempts ORDER BY planned_date DESC, created_at DESC, id DESC LIMIT ?",
            ATTEMPT_COLUMNS
        ))?;
        let attempts = stmt
            .query_map([limit as i64], map_attempt)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attempts)
    }

    pub fn count_solved_attempts_since(&self, since: NaiveDate) -> Result<i64> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count = conn.query_row(
            "SELECT COUNT(*) FROM resolve_attempts WHERE outcome = 'Solved' AND planned_date >= ?",
            [format_date(Some(since))],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn get_attempt(&self, id: i64) -> Result<Option<ResolveAttempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        get_attempt(&conn, id)
    }

    pub fn create_attempt(&self, input: NewResolveAttempt) -> Result<ResolveAttempt> {
        let conn = self.conn.lock().expect("database lock poisoned");
        get_problem(&conn, input.problem_id)?.ok_or(TrackerError::NotFound("Problem"))?;
        insert_attempt(&conn, &input)
    }

    pub fn update_attempt_outcome(&self, id: i64, input: OutcomeUpdate) -> Result<Option<ResolveAttempt>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let Some(existing) = get_attempt(&conn, id)? else {
            return Ok(None);
        };

        let minutes_spent = input.minutes_spent.or(existing.minutes_spent);
        conn.execute(
            "UPDATE resolve_attempts SET outcome = ?, minutes_spent = ? WHERE id = ?",
            (input.outcome.as_str(), minutes_spent, id),
        )?;

        Ok(Some(ResolveAttempt {
            outcome: input.outcome,
            minutes_spent,
            ..existing
        }))
    }

    // ============================================================
    // Batch imports
    // ============================================================

    /// Import pipe-delimited session lines in one transaction.
    pub fn import_session_lines(&self, text: &str, today: NaiveDate) -> Result<usize> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let imported = import::import_session_lines(&tx, text, today)?;
        tx.commit()?;
        tracing::info!("Imported {} sessions from bulk text", imported);
        Ok(imported)
    }

    /// Import spreadsheet sheets in one transaction.
    pub fn import_sheets(&self, sheets: &[Sheet]) -> Result<usize> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let imported = import::import_sheets(&tx, sheets)?;
        tx.commit()?;
        tracing::info!("Imported {} spreadsheet rows", imported);
        Ok(imported)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// Keeps a topic reference only when the topic exists.
fn existing_topic(conn: &Connection, topic_id: Option<i64>) -> Result<Option<i64>> {
    match topic_id {
        Some(id) => Ok(get_topic(conn, id)?.map(|t| t.id)),
        None => Ok(None),
    }
}
