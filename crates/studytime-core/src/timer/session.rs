//! One span of studying between `start` and `stop`.
//!
//! Paused intervals are excluded from the session's age:
//!
//! ```text
//! minutes = floor((end - started_at - paused) / 60s)
//! ```
//!
//! where `end` is the pause timestamp while paused and `now` otherwise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Set while a session exists.
    started_at: Option<DateTime<Utc>>,
    /// Total time spent paused, excluding the current pause.
    paused_ms: u64,
    /// Set while paused.
    paused_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn begin(now: DateTime<Utc>) -> Self {
        Self {
            started_at: Some(now),
            paused_ms: 0,
            paused_at: None,
        }
    }

    pub fn is_studying(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        self.paused_at
    }

    pub fn paused_ms(&self) -> u64 {
        self.paused_ms
    }

    /// Returns `false` unless studying and unpaused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_studying() || self.is_paused() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Fold the current pause into the paused total.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        match self.paused_at.take() {
            Some(paused_at) => {
                self.paused_ms = self.paused_ms.saturating_add(millis_between(paused_at, now));
                true
            }
            None => false,
        }
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let end = self.paused_at.unwrap_or(now);
        millis_between(started_at, end).saturating_sub(self.paused_ms)
    }

    /// Whole minutes studied; 0 when no session exists.
    pub fn minutes(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed_ms(now) / MS_PER_MINUTE
    }
}

/// Non-negative milliseconds from `from` to `to`.
fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}
