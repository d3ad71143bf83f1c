use std::collections::HashMap;

/// Canonical fields a spreadsheet column can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Topic,
    Title,
    Link,
    Source,
    Difficulty,
    Tags,
    Minutes,
    Date,
    Outcome,
    Notes,
}

/// Accepted header spellings per field, in priority order.
pub const COLUMN_ALIASES: &[(Field, &[&str])] = &[
    (Field::Topic, &["topic", "category", "subject"]),
    (Field::Title, &["title", "problem", "question", "name"]),
    (Field::Link, &["link", "url"]),
    (Field::Source, &["source", "platform"]),
    (Field::Difficulty, &["difficulty", "level"]),
    (Field::Tags, &["tags", "tag"]),
    (
        Field::Minutes,
        &["minutes", "time", "duration", "time (min)", "mins", "minute"],
    ),
    (Field::Date, &["date", "day"]),
    (Field::Outcome, &["outcome", "status", "result"]),
    (Field::Notes, &["notes", "remarks comment"]),
];

/// Binding from canonical field to column index for one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Bind each field to the first alias found among `headers`.
    ///
    /// Headers compare trimmed and lowercased. When two headers normalize to
    /// the same text the later one wins.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_ref().trim().to_lowercase(), i))
            .filter(|(h, _)| !h.is_empty())
            .collect();

        let columns = COLUMN_ALIASES
            .iter()
            .filter_map(|(field, aliases)| {
                aliases
                    .iter()
                    .find_map(|alias| normalized.get(*alias))
                    .map(|&index| (*field, index))
            })
            .collect();

        Self { columns }
    }

    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Trimmed cell text for `field`; empty when unbound or out of range.
    pub fn get<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        self.column(field)
            .and_then(|i| row.get(i))
            .map(|cell| cell.trim())
            .unwrap_or("")
    }
}
