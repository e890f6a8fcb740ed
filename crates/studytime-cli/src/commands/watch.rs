//! Foreground event loop.
//!
//! Pumps the tracker from a single-threaded tokio runtime so every check,
//! snooze and rest countdown runs on one thread. Events are printed as JSON
//! lines by the tracker's listener.
//!
//! Other invocations may change the saved state while the loop runs, so each
//! step reloads it before ticking and saving.

use std::time::Duration;

use clap::Args;
use studytime_core::storage::Database;
use studytime_core::{Config, Event, TrackerState};

use super::{load_tracker, read_snapshot, save_tracker, Tracker};

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between ticks
    #[arg(long, default_value = "1")]
    pub tick_secs: u64,
    /// Start a rest automatically when a forced rest fires
    #[arg(long)]
    pub auto_rest: bool,
    /// Start studying if no session is running
    #[arg(long)]
    pub start: bool,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(watch_loop(&args, &db, &config))
}

async fn watch_loop(
    args: &WatchArgs,
    db: &Database,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = load_tracker(db, config);
    tracker.set_listener(|event: &Event| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    });

    if args.start && tracker.start() {
        save_tracker(db, &tracker)?;
    }
    if tracker.state() == TrackerState::Idle {
        eprintln!("no study session running; use --start or `session start`");
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(args.tick_secs.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !step(db, &mut tracker, args.auto_rest)? {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, leaving session running");
                break;
            }
        }
    }

    tracker.release();
    Ok(())
}

/// Pick up the saved state, run due work and save it back.
///
/// Returns `false` once no session is running.
fn step(
    db: &Database,
    tracker: &mut Tracker<'_>,
    auto_rest: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    if let Some(snapshot) = read_snapshot(db) {
        tracker.apply_snapshot(snapshot);
    }

    let events = tracker.tick();
    let forced = events.iter().any(|e| matches!(e, Event::ForceRest { .. }));
    if forced && auto_rest {
        tracker.accept_rest();
    }
    save_tracker(db, tracker)?;
    Ok(tracker.state() != TrackerState::Idle)
}
