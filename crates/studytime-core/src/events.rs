use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::ReminderTier;

/// Every notification the tracker raises is an Event.
/// Front ends either register a listener or consume the events returned
/// from each tracker call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Emitted on every periodic check.
    TimeUpdate {
        session_minutes: u64,
        today_minutes: u64,
        at: DateTime<Utc>,
    },
    /// Informational; fired on exact multiples of the gentle interval.
    GentleReminder {
        session_minutes: u64,
        at: DateTime<Utc>,
    },
    /// The child is invited to rest; studying continues until the
    /// caller accepts or snoozes.
    StrongReminder {
        session_minutes: u64,
        at: DateTime<Utc>,
    },
    /// The tracker has paused itself; playback must stop.
    ForceRest {
        session_minutes: u64,
        at: DateTime<Utc>,
    },
    RestStarted {
        rest_secs: u64,
        at: DateTime<Utc>,
    },
    /// Rest finished and a fresh session is running.
    RestComplete {
        at: DateTime<Utc>,
    },
    EndStudy {
        session_minutes: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Reminder tier carried by this event, if any.
    pub fn tier(&self) -> Option<ReminderTier> {
        match self {
            Event::GentleReminder { .. } => Some(ReminderTier::Gentle),
            Event::StrongReminder { .. } => Some(ReminderTier::Strong),
            Event::ForceRest { .. } => Some(ReminderTier::Force),
            _ => None,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimeUpdate { at, .. }
            | Event::GentleReminder { at, .. }
            | Event::StrongReminder { at, .. }
            | Event::ForceRest { at, .. }
            | Event::RestStarted { at, .. }
            | Event::RestComplete { at }
            | Event::EndStudy { at, .. } => *at,
        }
    }
}
