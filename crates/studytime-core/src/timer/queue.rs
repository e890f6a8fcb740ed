//! Delayed-task queue pumped by the tracker's `tick()`.
//!
//! Holds at most one pending task per [`TaskKind`]. Posting a kind that is
//! already pending replaces it, mirroring "remove callbacks, then post".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Periodic study-time check.
    Check,
    /// One-off re-check after the child chose to keep studying.
    Snooze,
    /// End of the rest countdown.
    RestEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub due: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQueue {
    tasks: Vec<ScheduledTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_at(&mut self, kind: TaskKind, due: DateTime<Utc>) {
        self.cancel(kind);
        self.tasks.push(ScheduledTask { kind, due });
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.tasks.retain(|t| t.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    pub fn due_time(&self, kind: TaskKind) -> Option<DateTime<Utc>> {
        self.tasks.iter().find(|t| t.kind == kind).map(|t| t.due)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest due time across all pending tasks.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().map(|t| t.due).min()
    }

    /// Remove and return the earliest task due at or before `now`.
    ///
    /// Ties keep posting order.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<TaskKind> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(i, t)| (t.due, *i))
            .map(|(i, _)| i)?;
        Some(self.tasks.remove(idx).kind)
    }
}
