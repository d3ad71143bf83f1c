pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod forms;
pub mod import;
pub mod models;
pub mod progress;
pub mod views;

use chrono::NaiveDate;

/// The local calendar day, used wherever input falls back to "today".
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
