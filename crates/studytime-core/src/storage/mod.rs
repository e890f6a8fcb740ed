mod config;
pub mod database;
pub mod migrations;
mod study_log;

pub use config::{Config, ProgressConfig, RemindersConfig, RestConfig};
pub use database::{DailyStudyRecord, Database, ProgressSummary};
pub use study_log::{MemoryStudyLog, StudyLog};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/studytime[-dev]/` based on STUDYTIME_ENV.
///
/// Set STUDYTIME_ENV=dev to use a development data directory.
/// STUDYTIME_HOME overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYTIME_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("STUDYTIME_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studytime-dev")
            } else {
                base_dir.join("studytime")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
