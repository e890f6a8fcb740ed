use clap::Subcommand;
use serde::Serialize;
use studytime_core::storage::{DailyStudyRecord, Database};
use studytime_core::Config;

use super::{load_tracker, print_json};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's study time, including the running session
    Today,
    /// All-time totals and recent days
    All {
        /// Number of recent days to list
        #[arg(long, default_value = "7")]
        days: usize,
    },
}

#[derive(Serialize)]
struct AllTimeStats {
    total_days: u64,
    total_minutes: u64,
    recent: Vec<DailyStudyRecord>,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        StatsAction::Today => {
            let tracker = load_tracker(&db, &config);
            print_json(&tracker.statistics())?;
        }
        StatsAction::All { days } => {
            let stats = AllTimeStats {
                total_days: db.study_days()?,
                total_minutes: db.total_study_minutes()?,
                recent: db.daily_records(days)?,
            };
            print_json(&stats)?;
        }
    }
    Ok(())
}
