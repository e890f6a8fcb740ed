use clap::Subcommand;
use serde::Serialize;
use studytime_core::storage::Database;
use studytime_core::Config;

use super::{load_tracker, print_json, save_tracker, StatusReport};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start studying, or resume after a pause
    Start,
    /// Pause the session
    Pause,
    /// Stop the session and record its minutes
    Stop,
    /// Run any due checks and print the current state as JSON
    Status,
    /// Take a rest now (also the answer to a rest reminder)
    Rest,
    /// End the rest early and start a fresh session
    FinishRest,
    /// Keep studying after a strong reminder
    Snooze,
    /// Stop studying for today
    End,
}

#[derive(Serialize)]
struct Stopped {
    #[serde(rename = "type")]
    kind: &'static str,
    minutes: u64,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut tracker = load_tracker(&db, &config);

    match action {
        SessionAction::Start => {
            tracker.start();
            let events = tracker.tick();
            print_json(&StatusReport::new(&tracker, events))?;
        }
        SessionAction::Pause => {
            let mut events = tracker.tick();
            tracker.pause();
            events.extend(tracker.tick());
            print_json(&StatusReport::new(&tracker, events))?;
        }
        SessionAction::Stop => {
            let minutes = tracker.stop();
            print_json(&Stopped {
                kind: "session_stopped",
                minutes,
            })?;
        }
        SessionAction::Status => {
            let events = tracker.tick();
            print_json(&StatusReport::new(&tracker, events))?;
        }
        SessionAction::Rest => {
            let mut events = tracker.tick();
            events.extend(tracker.accept_rest());
            print_json(&StatusReport::new(&tracker, events))?;
        }
        SessionAction::FinishRest => {
            let mut events = tracker.finish_rest();
            events.extend(tracker.tick());
            print_json(&StatusReport::new(&tracker, events))?;
        }
        SessionAction::Snooze => {
            let mut events = tracker.tick();
            tracker.snooze();
            events.extend(tracker.tick());
            print_json(&StatusReport::new(&tracker, events))?;
        }
        SessionAction::End => {
            let events = tracker.end_study();
            print_json(&StatusReport::new(&tracker, events))?;
        }
    }

    save_tracker(&db, &tracker)?;
    Ok(())
}
