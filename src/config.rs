use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::Database;

pub const DEFAULT_PORT: u16 = 5000;

/// Runtime settings from `DSA_TRACKER_DB` and `DSA_TRACKER_PORT`.
/// Command-line flags take precedence over both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` means the platform data directory.
    pub db_path: Option<PathBuf>,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("DSA_TRACKER_DB").ok(),
            std::env::var("DSA_TRACKER_PORT").ok(),
        )
    }

    fn from_vars(db: Option<String>, port: Option<String>) -> Result<Self> {
        let port = match port.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PORT,
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid DSA_TRACKER_PORT {:?}", raw))?,
        };
        Ok(Self {
            db_path: db.filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            port,
        })
    }

    pub fn with_overrides(self, db_path: Option<PathBuf>, port: Option<u16>) -> Self {
        Self {
            db_path: db_path.or(self.db_path),
            port: port.unwrap_or(self.port),
        }
    }

    /// Open, migrate and seed the configured database.
    pub fn open_database(&self) -> Result<Database> {
        let db = match &self.db_path {
            Some(path) => Database::open(path.clone())?,
            None => Database::open_default()?,
        };
        db.migrate()?;
        db.seed_defaults()?;
        Ok(db)
    }
}
