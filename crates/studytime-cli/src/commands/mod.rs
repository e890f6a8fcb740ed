pub mod config;
pub mod progress;
pub mod session;
pub mod stats;
pub mod watch;

use serde::Serialize;
use studytime_core::storage::Database;
use studytime_core::timer::{format_countdown, SystemClock};
use studytime_core::{Config, Event, StudyTimeTracker, TrackerSnapshot, TrackerState};

const TRACKER_KEY: &str = "tracker";

pub type Tracker<'db> = StudyTimeTracker<SystemClock, &'db Database>;

/// Rebuild the tracker saved by the previous invocation, or a fresh one.
pub fn load_tracker<'db>(db: &'db Database, config: &Config) -> Tracker<'db> {
    let snapshot = read_snapshot(db).unwrap_or_default();
    StudyTimeTracker::restore(config.tracker_settings(), SystemClock, db, snapshot)
}

/// The saved tracker state. `None` when it cannot be read; a missing entry
/// is an idle tracker.
pub fn read_snapshot(db: &Database) -> Option<TrackerSnapshot> {
    match db.kv_get(TRACKER_KEY) {
        Ok(Some(json)) => match serde_json::from_str::<TrackerSnapshot>(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable tracker state");
                None
            }
        },
        Ok(None) => Some(TrackerSnapshot::default()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read tracker state");
            None
        }
    }
}

pub fn save_tracker(db: &Database, tracker: &Tracker<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(&tracker.snapshot())?;
    db.kv_set(TRACKER_KEY, &json)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state: TrackerState,
    pub session_minutes: u64,
    pub today_minutes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_remaining: Option<String>,
    pub events: Vec<Event>,
}

impl StatusReport {
    pub fn new(tracker: &Tracker<'_>, events: Vec<Event>) -> Self {
        Self {
            state: tracker.state(),
            session_minutes: tracker.session_minutes(),
            today_minutes: tracker.today_total_minutes(),
            rest_remaining: tracker.rest_remaining().map(format_countdown),
            events,
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
