//! Best-effort import of practice logs.
//!
//! Two inputs are supported:
//!
//! - spreadsheet workbooks ([`read_workbook`] + [`import_sheets`]), where each
//!   sheet's headers are mapped to canonical fields through an alias table;
//! - pipe-delimited session lines ([`import_session_lines`]) in the form
//!   `date|topic|title|minutes|outcome|notes`.
//!
//! Both resolve or create topics and problems by name and run inside the
//! caller's transaction.

mod bulk;
mod columns;
mod dates;
mod rows;
mod workbook;

pub use bulk::{import_session_lines, parse_session_line, SessionLine};
pub use columns::{ColumnMap, Field, COLUMN_ALIASES};
pub use dates::parse_lenient_date;
pub use rows::{import_sheets, sheet_is_importable};
pub use workbook::{read_workbook, read_workbook_bytes, Sheet};
