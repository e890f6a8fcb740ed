//! # Studytime Core Library
//!
//! Core logic for a child's flash-card study session: how long the child
//! has been studying, when to suggest or enforce a break, and what has been
//! learned so far. The `studytime-cli` binary is a thin layer over this
//! library.
//!
//! ## Architecture
//!
//! - **Tracker**: a wall-clock state machine that requires the caller to
//!   periodically invoke `tick()`; it never spawns threads
//! - **Storage**: SQLite daily study record and progress, TOML configuration
//!
//! ## Key Components
//!
//! - [`StudyTimeTracker`]: session tracking and tiered rest reminders
//! - [`Event`]: notifications raised by the tracker
//! - [`StudyLog`]: the daily record the tracker writes finished sessions to
//! - [`Database`]: SQLite implementation of [`StudyLog`] plus progress
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use storage::{Config, Database, MemoryStudyLog, ProgressSummary, StudyLog};
pub use timer::{
    Clock, ManualClock, ReminderTier, StudyStatistics, StudyTimeTracker, SystemClock,
    TrackerSettings, TrackerSnapshot, TrackerState,
};
