//! User-facing failures.
//!
//! Store and import code returns `anyhow::Result`; failures the user caused
//! (missing fields, unknown ids, duplicates) are raised as [`TrackerError`] so
//! the HTTP layer can recover them with `downcast_ref` and answer with a
//! matching status. Everything else is treated as internal.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// Input rejected before anything was written.
    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule checked up front (e.g. topic names on the add path).
    #[error("{0}")]
    Conflict(String),
}

impl TrackerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
