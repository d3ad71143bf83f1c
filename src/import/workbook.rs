use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};

use super::rows::sheet_is_importable;

/// One worksheet flattened to text: the first row is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Build a sheet from raw rows, taking the first as the header.
    pub fn from_rows<S: Into<String>>(name: impl Into<String>, rows: Vec<Vec<S>>) -> Self {
        let mut rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect::<Vec<String>>());
        let headers = rows.next().unwrap_or_default();
        Self {
            name: name.into(),
            headers,
            rows: rows.collect(),
        }
    }
}

/// Read every importable sheet of an `.xlsx`/`.xls`/`.ods` file.
pub fn read_workbook(path: &Path) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    read_sheets(&mut workbook)
}

/// Same as [`read_workbook`] for an uploaded file held in memory.
pub fn read_workbook_bytes(bytes: Vec<u8>) -> Result<Vec<Sheet>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to read workbook")?;
    read_sheets(&mut workbook)
}

fn read_sheets<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Vec<Sheet>> {
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        if !sheet_is_importable(&name) {
            tracing::debug!("Skipping sheet {:?}", name);
            continue;
        }
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Failed to read sheet {}", name))?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(Sheet::from_rows(name, rows));
    }
    Ok(sheets)
}

/// Render a cell the way it would be typed: whole floats without `.0`,
/// dates as `YYYY-MM-DD`, blanks and error cells as empty text.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
