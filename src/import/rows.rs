use anyhow::Result;
use rusqlite::Connection;

use super::columns::{ColumnMap, Field};
use super::dates::parse_lenient_date;
use super::workbook::Sheet;
use crate::db::queries::{
    find_problem_by_title_link, insert_problem, insert_session, topic_by_name_or_create,
};
use crate::models::{NewProblem, NewSession};

/// Only weekly logs and the summary/"other prep" sheets carry practice rows.
pub fn sheet_is_importable(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with("week") || name == "summary" || name == "other prep"
}

/// Import practice rows from `sheets`, returning how many titled rows were
/// processed. Sheets with other names are ignored.
pub fn import_sheets(conn: &Connection, sheets: &[Sheet]) -> Result<usize> {
    let mut total = 0;
    for sheet in sheets {
        if !sheet_is_importable(&sheet.name) || sheet.rows.is_empty() {
            continue;
        }

        let columns = ColumnMap::from_headers(&sheet.headers);
        if columns.column(Field::Title).is_none() {
            tracing::warn!("Sheet {:?} has no title column", sheet.name);
        }

        let mut imported = 0;
        for row in &sheet.rows {
            if import_row(conn, &columns, row)? {
                imported += 1;
            }
        }
        tracing::debug!("Sheet {:?}: {} rows", sheet.name, imported);
        total += imported;
    }
    Ok(total)
}

/// Returns `false` for rows skipped for lack of a title.
fn import_row(conn: &Connection, columns: &ColumnMap, row: &[String]) -> Result<bool> {
    let title = columns.get(row, Field::Title);
    if title.is_empty() {
        return Ok(false);
    }

    let topic_name = columns.get(row, Field::Topic);
    let link = columns.get(row, Field::Link);
    let minutes = parse_minutes(columns.get(row, Field::Minutes));
    let outcome = match columns.get(row, Field::Outcome) {
        "" if minutes > 0 => "Solved",
        other => other,
    };
    let notes = columns.get(row, Field::Notes);

    let topic = if topic_name.is_empty() {
        None
    } else {
        Some(topic_by_name_or_create(conn, topic_name)?)
    };

    let problem = match find_problem_by_title_link(conn, title, link)? {
        Some(problem) => problem,
        None => {
            let source = match columns.get(row, Field::Source) {
                "" => "LeetCode",
                source => source,
            };
            insert_problem(
                conn,
                &NewProblem {
                    source: source.to_string(),
                    link: link.to_string(),
                    difficulty: columns.get(row, Field::Difficulty).to_string(),
                    tags: columns.get(row, Field::Tags).to_string(),
                    notes: notes.to_string(),
                    topic_id: topic.as_ref().map(|t| t.id),
                    ..NewProblem::titled(title)
                },
            )?
        }
    };

    if minutes > 0 || !outcome.is_empty() {
        insert_session(
            conn,
            &NewSession {
                date: parse_lenient_date(columns.get(row, Field::Date)),
                duration_minutes: minutes,
                outcome: outcome.to_string(),
                notes: notes.to_string(),
                topic_id: topic.as_ref().map(|t| t.id).or(problem.topic_id),
                problem_id: Some(problem.id),
                ..NewSession::default()
            },
        )?;
    }

    Ok(true)
}

/// Whole minutes from numeric text such as `"30"` or `"12.9"`; zero otherwise.
fn parse_minutes(raw: &str) -> i64 {
    raw.parse::<f64>()
        .ok()
        .filter(|m| m.is_finite())
        .map(|m| m.trunc() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_importable_sheet_names() {
        assert!(sheet_is_importable("Week 1"));
        assert!(sheet_is_importable("WEEKLY"));
        assert!(sheet_is_importable("Summary"));
        assert!(sheet_is_importable("other prep"));
        assert!(!sheet_is_importable("Notes"));
        assert!(!sheet_is_importable("Summary 2"));
    }

    #[test]
    fn minutes_tolerate_decimal_text() {
        assert_eq!(parse_minutes("30"), 30);
        assert_eq!(parse_minutes("12.9"), 12);
        assert_eq!(parse_minutes("abc"), 0);
        assert_eq!(parse_minutes(""), 0);
        assert_eq!(parse_minutes("NaN"), 0);
    }
}
