mod clock;
mod queue;
mod session;
mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use queue::{ScheduledTask, TaskKind, TaskQueue};
pub use session::Session;
pub use tracker::{
    format_countdown, ReminderTier, StudyStatistics, StudyTimeTracker, TrackerSettings,
    TrackerSnapshot, TrackerState,
};
