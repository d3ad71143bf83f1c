use std::io::Write;

use anyhow::Result;

use crate::db::Database;
use crate::models::SessionDetail;

pub const CSV_HEADER: [&str; 7] = ["date", "topic", "problem", "minutes", "attempts", "outcome", "notes"];

/// Write session history as CSV, newest date first. Returns the row count.
pub fn write_sessions_csv<W: Write>(sessions: &[SessionDetail], out: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for detail in sessions {
        let session = &detail.session;
        writer.write_record([
            session.date.map(|d| d.to_string()).unwrap_or_default(),
            detail.topic_name.clone().unwrap_or_default(),
            detail.problem_title.clone().unwrap_or_default(),
            session.duration_minutes.to_string(),
            session.attempts.to_string(),
            session.outcome.clone(),
            session.notes.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(sessions.len())
}

/// The whole session history as CSV text.
pub fn sessions_csv(db: &Database) -> Result<String> {
    let sessions = db.get_session_details(None)?;
    let mut buf = Vec::new();
    write_sessions_csv(&sessions, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
