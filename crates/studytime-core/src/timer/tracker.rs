//! Study time tracker.
//!
//! A wall-clock state machine with no internal threads. Work that the
//! tracker wants done later (the periodic check, a snoozed re-check, the end
//! of a rest) is posted to its [`TaskQueue`]; the caller pumps the queue by
//! calling [`StudyTimeTracker::tick`] from its event loop.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Studying -> Paused -> Studying -> Idle (stop)
//!            |  ^
//!            v  |
//!          Resting
//! ```
//!
//! `Resting` is `Paused` with a pending rest countdown.
//!
//! ## Reminder tiers
//!
//! Each check emits a `TimeUpdate` followed by at most one reminder, the
//! most severe that applies: forced rest, strong reminder, gentle reminder.
//! Gentle reminders fire only on exact multiples of the gentle interval, so
//! a check that lands late can skip one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::queue::{TaskKind, TaskQueue};
use super::session::Session;
use crate::events::Event;
use crate::storage::StudyLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Idle,
    Studying,
    Paused,
    Resting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderTier {
    Gentle,
    Strong,
    Force,
}

impl ReminderTier {
    /// Most severe tier that applies to `session_minutes`.
    pub fn for_minutes(session_minutes: u64, settings: &TrackerSettings) -> Option<Self> {
        if session_minutes >= settings.force_minutes {
            Some(ReminderTier::Force)
        } else if session_minutes >= settings.strong_minutes {
            Some(ReminderTier::Strong)
        } else if settings.gentle_minutes > 0
            && session_minutes >= settings.gentle_minutes
            && session_minutes % settings.gentle_minutes == 0
        {
            Some(ReminderTier::Gentle)
        } else {
            None
        }
    }
}

/// Thresholds and durations the tracker runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSettings {
    pub gentle_minutes: u64,
    pub strong_minutes: u64,
    pub force_minutes: u64,
    pub check_interval_secs: u64,
    pub rest_minutes: u64,
    pub snooze_minutes: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            gentle_minutes: 15,
            strong_minutes: 20,
            force_minutes: 30,
            check_interval_secs: 60,
            rest_minutes: 5,
            snooze_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStatistics {
    pub today_minutes: u64,
    pub session_minutes: u64,
    pub total_days: u64,
    pub average_minutes_per_day: u64,
    /// Today's total is within the strong-reminder threshold.
    pub is_healthy_duration: bool,
}

/// Serializable tracker state, for front ends that outlive a single process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub session: Session,
    pub queue: TaskQueue,
}

type Listener = Box<dyn FnMut(&Event)>;

pub struct StudyTimeTracker<C: Clock, L: StudyLog> {
    settings: TrackerSettings,
    clock: C,
    log: L,
    session: Session,
    queue: TaskQueue,
    listener: Option<Listener>,
}

impl<C: Clock, L: StudyLog> StudyTimeTracker<C, L> {
    pub fn new(settings: TrackerSettings, clock: C, log: L) -> Self {
        Self::restore(settings, clock, log, TrackerSnapshot::default())
    }

    pub fn restore(settings: TrackerSettings, clock: C, log: L, snapshot: TrackerSnapshot) -> Self {
        Self {
            settings,
            clock,
            log,
            session: snapshot.session,
            queue: snapshot.queue,
            listener: None,
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            session: self.session.clone(),
            queue: self.queue.clone(),
        }
    }

    /// Replace session and pending tasks with state saved elsewhere.
    ///
    /// Settings and the listener are kept.
    pub fn apply_snapshot(&mut self, snapshot: TrackerSnapshot) {
        self.session = snapshot.session;
        self.queue = snapshot.queue;
    }

    /// Register the callback that receives every event.
    ///
    /// Events are also returned from the call that raised them.
    pub fn set_listener(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn state(&self) -> TrackerState {
        if !self.session.is_studying() {
            TrackerState::Idle
        } else if self.is_resting() {
            TrackerState::Resting
        } else if self.session.is_paused() {
            TrackerState::Paused
        } else {
            TrackerState::Studying
        }
    }

    pub fn is_studying(&self) -> bool {
        self.session.is_studying()
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_paused()
    }

    pub fn is_resting(&self) -> bool {
        self.queue.is_pending(TaskKind::RestEnd)
    }

    pub fn session_minutes(&self) -> u64 {
        self.session.minutes(self.clock.now())
    }

    /// Stored minutes for today plus the running session.
    pub fn today_total_minutes(&self) -> u64 {
        self.log.minutes_for_today(&self.clock) + self.session_minutes()
    }

    /// Time left in the rest countdown.
    pub fn rest_remaining(&self) -> Option<Duration> {
        let due = self.queue.due_time(TaskKind::RestEnd)?;
        Some((due - self.clock.now()).max(Duration::zero()))
    }

    /// When `tick` next has work to do.
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.queue.next_due()
    }

    pub fn statistics(&self) -> StudyStatistics {
        let session_minutes = self.session_minutes();
        let today_minutes = self.today_total_minutes();
        let total_days = self.log.total_study_days();
        // a live session on an unrecorded day still counts as a day
        let live_day = self.session.is_studying() && !self.log.studied_on(self.clock.today());
        let days = total_days + u64::from(live_day);
        let average_minutes_per_day = if days > 0 {
            (self.log.total_minutes() + session_minutes) / days
        } else {
            0
        };

        StudyStatistics {
            today_minutes,
            session_minutes,
            total_days,
            average_minutes_per_day,
            is_healthy_duration: today_minutes <= self.settings.strong_minutes,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session, or resume a paused one.
    ///
    /// Returns `false` when already studying. Resuming during a rest
    /// abandons the countdown without resetting the session.
    pub fn start(&mut self) -> bool {
        if self.session.is_studying() && !self.session.is_paused() {
            return false;
        }

        let now = self.clock.now();
        if self.session.resume(now) {
            self.queue.cancel(TaskKind::RestEnd);
            tracing::debug!(paused_ms = self.session.paused_ms(), "study resumed");
        } else {
            self.session = Session::begin(now);
            tracing::debug!("study session started");
        }

        self.queue.post_at(TaskKind::Check, now);
        true
    }

    /// Returns `false` unless studying and unpaused.
    pub fn pause(&mut self) -> bool {
        if !self.session.pause(self.clock.now()) {
            tracing::debug!(state = ?self.state(), "pause ignored");
            return false;
        }
        self.queue.cancel(TaskKind::Check);
        self.queue.cancel(TaskKind::Snooze);
        tracing::debug!(session_minutes = self.session_minutes(), "study paused");
        true
    }

    /// Finish the session, persist its minutes and return them.
    ///
    /// Returns 0 without touching the record when idle. All pending tasks
    /// are cancelled.
    pub fn stop(&mut self) -> u64 {
        if !self.session.is_studying() {
            return 0;
        }

        let minutes = self.session_minutes();
        self.log.add_minutes(self.clock.today(), minutes);
        self.session = Session::default();
        self.queue.cancel_all();
        tracing::info!(minutes, "study session stopped");
        minutes
    }

    /// Run every task that has come due.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        let now = self.clock.now();
        // a snoozed check and a periodic check due together report once
        let mut checked = false;

        while let Some(kind) = self.queue.pop_due(now) {
            match kind {
                TaskKind::Check => {
                    if !checked {
                        self.check(&mut events);
                        checked = true;
                    }
                    if self.session.is_studying() && !self.session.is_paused() {
                        let interval = self.settings.check_interval_secs.max(1);
                        self.queue.post_at(TaskKind::Check, offset(now, interval));
                    }
                }
                TaskKind::Snooze => {
                    let check_due = self
                        .queue
                        .due_time(TaskKind::Check)
                        .is_some_and(|due| due <= now);
                    if !checked && !check_due {
                        self.check(&mut events);
                        checked = true;
                    }
                }
                TaskKind::RestEnd => {
                    self.complete_rest(&mut events);
                    checked = false;
                }
            }
        }
        events
    }

    /// Pause and start the rest countdown.
    pub fn begin_rest(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.session.is_studying() {
            return events;
        }

        self.pause();
        self.queue.cancel(TaskKind::Snooze);

        let now = self.clock.now();
        let rest_secs = self.settings.rest_minutes.saturating_mul(60);
        self.queue.post_at(TaskKind::RestEnd, offset(now, rest_secs));
        tracing::info!(rest_secs, "rest started");
        self.emit(&mut events, Event::RestStarted { rest_secs, at: now });
        events
    }

    /// Response to a strong or forced reminder.
    pub fn accept_rest(&mut self) -> Vec<Event> {
        self.begin_rest()
    }

    /// Keep studying after a strong reminder; re-check after the snooze delay.
    pub fn snooze(&mut self) -> bool {
        if !self.session.is_studying() || self.session.is_paused() {
            return false;
        }
        let due = offset(self.clock.now(), self.settings.snooze_minutes.saturating_mul(60));
        self.queue.post_at(TaskKind::Snooze, due);
        tracing::debug!(%due, "reminder snoozed");
        true
    }

    /// End the rest early.
    pub fn finish_rest(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.is_resting() {
            self.complete_rest(&mut events);
        }
        events
    }

    /// Stop studying for the day: abandon any rest, stop the session and
    /// announce it.
    pub fn end_study(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.session.is_studying() {
            return events;
        }
        let now = self.clock.now();
        let session_minutes = self.stop();
        self.emit(
            &mut events,
            Event::EndStudy {
                session_minutes,
                at: now,
            },
        );
        events
    }

    /// Cancel all pending work and drop the listener.
    pub fn release(&mut self) {
        self.queue.cancel_all();
        self.listener = None;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn check(&mut self, events: &mut Vec<Event>) {
        let now = self.clock.now();
        let session_minutes = self.session_minutes();
        let today_minutes = self.today_total_minutes();
        tracing::debug!(session_minutes, today_minutes, "study time check");

        self.emit(
            events,
            Event::TimeUpdate {
                session_minutes,
                today_minutes,
                at: now,
            },
        );

        match ReminderTier::for_minutes(session_minutes, &self.settings) {
            Some(ReminderTier::Force) => {
                self.pause();
                tracing::info!(session_minutes, "forced rest");
                self.emit(events, Event::ForceRest { session_minutes, at: now });
            }
            Some(ReminderTier::Strong) => {
                tracing::info!(session_minutes, "strong rest reminder");
                self.emit(events, Event::StrongReminder { session_minutes, at: now });
            }
            Some(ReminderTier::Gentle) => {
                tracing::info!(session_minutes, "gentle rest reminder");
                self.emit(events, Event::GentleReminder { session_minutes, at: now });
            }
            None => {}
        }
    }

    /// Close the pre-rest segment into the daily record and start afresh.
    fn complete_rest(&mut self, events: &mut Vec<Event>) {
        self.queue.cancel(TaskKind::RestEnd);

        let segment_minutes = self.session_minutes();
        self.log.add_minutes(self.clock.today(), segment_minutes);

        let now = self.clock.now();
        self.session = Session::begin(now);
        self.queue.cancel(TaskKind::Snooze);
        self.queue.post_at(TaskKind::Check, now);
        tracing::info!(segment_minutes, "rest complete, new session started");
        self.emit(events, Event::RestComplete { at: now });
    }

    fn emit(&mut self, events: &mut Vec<Event>, event: Event) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&event);
        }
        events.push(event);
    }
}

/// `now` plus `secs`, clamped to the latest representable instant.
fn offset(now: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Format a countdown as `m:ss`, counting a partial second as whole.
pub fn format_countdown(remaining: Duration) -> String {
    let ms = remaining.num_milliseconds().max(0);
    let secs = (ms + 999) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStudyLog;
    use crate::timer::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    type TestTracker = StudyTimeTracker<Rc<ManualClock>, Rc<MemoryStudyLog>>;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn tracker() -> (TestTracker, Rc<ManualClock>, Rc<MemoryStudyLog>) {
        let clock = Rc::new(ManualClock::new(t0()));
        let log = Rc::new(MemoryStudyLog::new());
        let tracker = StudyTimeTracker::new(TrackerSettings::default(), clock.clone(), log.clone());
        (tracker, clock, log)
    }

    /// Advance one minute at a time, ticking after each step.
    fn run_minutes(tracker: &mut TestTracker, clock: &ManualClock, minutes: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..minutes {
            clock.advance_minutes(1);
            events.extend(tracker.tick());
        }
        events
    }

    fn reminders(events: &[Event]) -> Vec<(ReminderTier, u64)> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::GentleReminder { session_minutes, .. }
                | Event::StrongReminder { session_minutes, .. }
                | Event::ForceRest { session_minutes, .. } => Some((e.tier()?, *session_minutes)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tier_selection_prefers_most_severe() {
        let s = TrackerSettings::default();
        assert_eq!(ReminderTier::for_minutes(0, &s), None);
        assert_eq!(ReminderTier::for_minutes(14, &s), None);
        assert_eq!(ReminderTier::for_minutes(15, &s), Some(ReminderTier::Gentle));
        for m in 16..20 {
            assert_eq!(ReminderTier::for_minutes(m, &s), None, "minute {m}");
        }
        for m in 20..30 {
            assert_eq!(ReminderTier::for_minutes(m, &s), Some(ReminderTier::Strong));
        }
        assert_eq!(ReminderTier::for_minutes(30, &s), Some(ReminderTier::Force));
        assert_eq!(ReminderTier::for_minutes(45, &s), Some(ReminderTier::Force));
    }

    #[test]
    fn gentle_fires_only_on_exact_multiples_below_strong() {
        let s = TrackerSettings {
            gentle_minutes: 15,
            strong_minutes: 100,
            force_minutes: 200,
            ..TrackerSettings::default()
        };
        let gentle: Vec<u64> = (0..60)
            .filter(|m| ReminderTier::for_minutes(*m, &s) == Some(ReminderTier::Gentle))
            .collect();
        assert_eq!(gentle, vec![15, 30, 45]);
    }

    #[test]
    fn start_is_idempotent_while_studying() {
        let (mut t, clock, _) = tracker();
        assert!(t.start());
        clock.advance_minutes(3);
        assert!(!t.start());
        assert_eq!(t.session_minutes(), 3);
        assert_eq!(t.state(), TrackerState::Studying);
    }

    #[test]
    fn invalid_transitions_are_ignored() {
        let (mut t, _, log) = tracker();
        assert!(!t.pause());
        assert!(!t.snooze());
        assert_eq!(t.stop(), 0);
        assert!(t.begin_rest().is_empty());
        assert!(t.finish_rest().is_empty());
        assert!(t.end_study().is_empty());
        assert_eq!(t.state(), TrackerState::Idle);
        assert_eq!(log.total_study_days(), 0);
    }

    #[test]
    fn first_tick_after_start_checks_immediately() {
        let (mut t, _, _) = tracker();
        t.start();
        let events = t.tick();
        assert!(matches!(
            events.as_slice(),
            [Event::TimeUpdate {
                session_minutes: 0,
                today_minutes: 0,
                ..
            }]
        ));
    }

    #[test]
    fn stop_returns_and_persists_whole_minutes() {
        let (mut t, clock, log) = tracker();
        t.start();
        clock.advance(Duration::minutes(12) + Duration::seconds(40));
        assert_eq!(t.stop(), 12);
        assert_eq!(log.minutes_on(clock.today()), 12);
        assert_eq!(t.state(), TrackerState::Idle);
        assert_eq!(t.session_minutes(), 0);
        assert!(t.next_wakeup().is_none());
    }

    #[test]
    fn paused_time_is_not_counted() {
        let (mut t, clock, log) = tracker();
        t.start();
        clock.advance_minutes(5);
        assert!(t.pause());
        assert_eq!(t.state(), TrackerState::Paused);
        clock.advance_minutes(40);
        assert_eq!(t.session_minutes(), 5);
        assert!(t.start());
        clock.advance_minutes(2);
        assert_eq!(t.session_minutes(), 7);
        assert_eq!(t.stop(), 7);
        assert_eq!(log.total_minutes(), 7);
    }

    #[test]
    fn no_checks_while_paused() {
        let (mut t, clock, _) = tracker();
        t.start();
        t.tick();
        t.pause();
        let events = run_minutes(&mut t, &clock, 10);
        assert!(events.is_empty());
    }

    #[test]
    fn reminder_sequence_over_a_session() {
        let (mut t, clock, _) = tracker();
        t.start();
        t.tick();
        let events = run_minutes(&mut t, &clock, 30);

        let mut expected = vec![(ReminderTier::Gentle, 15)];
        expected.extend((20..30).map(|m| (ReminderTier::Strong, m)));
        expected.push((ReminderTier::Force, 30));
        assert_eq!(reminders(&events), expected);

        let updates = events
            .iter()
            .filter(|e| matches!(e, Event::TimeUpdate { .. }))
            .count();
        assert_eq!(updates, 30);
    }

    #[test]
    fn force_rest_fires_alone_and_pauses() {
        let (mut t, clock, _) = tracker();
        t.start();
        t.tick();
        run_minutes(&mut t, &clock, 29);

        clock.advance_minutes(1);
        let events = t.tick();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::TimeUpdate { session_minutes: 30, .. }));
        assert!(matches!(events[1], Event::ForceRest { session_minutes: 30, .. }));
        assert_eq!(t.state(), TrackerState::Paused);

        // paused: checking stops
        assert!(run_minutes(&mut t, &clock, 5).is_empty());
        assert_eq!(t.session_minutes(), 30);
    }

    #[test]
    fn rest_countdown_resets_session_but_keeps_today() {
        let (mut t, clock, log) = tracker();
        t.start();
        t.tick();
        run_minutes(&mut t, &clock, 30);
        assert_eq!(t.state(), TrackerState::Paused);

        let events = t.accept_rest();
        assert!(matches!(events.as_slice(), [Event::RestStarted { rest_secs: 300, .. }]));
        assert_eq!(t.state(), TrackerState::Resting);
        assert_eq!(t.rest_remaining(), Some(Duration::minutes(5)));

        clock.advance_minutes(2);
        assert!(t.tick().is_empty());
        assert_eq!(t.rest_remaining(), Some(Duration::minutes(3)));

        clock.advance_minutes(3);
        let events = t.tick();
        assert!(matches!(events[0], Event::RestComplete { .. }));
        assert!(matches!(
            events[1],
            Event::TimeUpdate {
                session_minutes: 0,
                today_minutes: 30,
                ..
            }
        ));
        assert_eq!(t.state(), TrackerState::Studying);
        assert_eq!(t.session_minutes(), 0);
        assert_eq!(log.minutes_on(clock.today()), 30);

        clock.advance_minutes(4);
        assert_eq!(t.session_minutes(), 4);
        assert_eq!(t.today_total_minutes(), 34);
    }

    #[test]
    fn finish_rest_early() {
        let (mut t, clock, _) = tracker();
        t.start();
        clock.advance_minutes(22);
        t.begin_rest();
        clock.advance_minutes(1);
        let events = t.finish_rest();
        assert!(matches!(events.as_slice(), [Event::RestComplete { .. }]));
        assert!(t.rest_remaining().is_none());
        assert_eq!(t.today_total_minutes(), 22);
    }

    #[test]
    fn resuming_during_rest_abandons_countdown() {
        let (mut t, clock, _) = tracker();
        t.start();
        clock.advance_minutes(21);
        t.begin_rest();
        clock.advance_minutes(1);
        assert!(t.start());
        assert_eq!(t.state(), TrackerState::Studying);
        assert_eq!(t.session_minutes(), 21);
        assert!(t.rest_remaining().is_none());
    }

    #[test]
    fn snooze_adds_an_extra_check() {
        let settings = TrackerSettings {
            check_interval_secs: 3600,
            ..TrackerSettings::default()
        };
        let clock = Rc::new(ManualClock::new(t0()));
        let log = Rc::new(MemoryStudyLog::new());
        let mut t = StudyTimeTracker::new(settings, clock.clone(), log);
        t.start();
        t.tick();

        clock.advance_minutes(20);
        assert!(t.snooze());
        clock.advance_minutes(5);
        let events = t.tick();
        assert_eq!(reminders(&events), vec![(ReminderTier::Strong, 25)]);
    }

    #[test]
    fn snooze_landing_on_a_periodic_check_reports_once() {
        let (mut t, clock, _) = tracker();
        t.start();
        t.tick();
        clock.advance_minutes(10);
        t.tick();
        assert!(t.snooze());

        let events = run_minutes(&mut t, &clock, 5);
        let updates: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::TimeUpdate { session_minutes, .. } => Some(*session_minutes),
                _ => None,
            })
            .collect();
        assert_eq!(updates, vec![11, 12, 13, 14, 15]);
        assert_eq!(reminders(&events), vec![(ReminderTier::Gentle, 15)]);
        assert!(t.next_wakeup().is_some());
    }

    #[test]
    fn oversized_durations_clamp_instead_of_overflowing() {
        let settings = TrackerSettings {
            rest_minutes: u64::MAX,
            snooze_minutes: u64::MAX,
            check_interval_secs: u64::MAX,
            ..TrackerSettings::default()
        };
        let clock = Rc::new(ManualClock::new(t0()));
        let mut t = StudyTimeTracker::new(settings, clock.clone(), MemoryStudyLog::new());
        t.start();
        t.tick();
        assert!(t.snooze());
        assert!(t.tick().is_empty());

        t.begin_rest();
        clock.advance_minutes(60);
        assert!(t.tick().is_empty());
        assert_eq!(t.state(), TrackerState::Resting);
        assert!(t.rest_remaining().is_some_and(|left| left > Duration::days(365)));
    }

    #[test]
    fn apply_snapshot_replaces_running_state() {
        let (mut t, clock, _) = tracker();
        t.start();
        clock.advance_minutes(4);
        t.apply_snapshot(TrackerSnapshot::default());
        assert_eq!(t.state(), TrackerState::Idle);
        assert_eq!(t.stop(), 0);
        assert!(t.tick().is_empty());
    }

    #[test]
    fn end_study_stops_and_announces() {
        let (mut t, clock, log) = tracker();
        t.start();
        clock.advance_minutes(31);
        t.tick();
        t.begin_rest();
        let events = t.end_study();
        assert!(matches!(
            events.as_slice(),
            [Event::EndStudy {
                session_minutes: 31,
                ..
            }]
        ));
        assert_eq!(t.state(), TrackerState::Idle);
        assert_eq!(log.total_minutes(), 31);
        assert!(t.next_wakeup().is_none());
    }

    #[test]
    fn listener_sees_every_event_until_release() {
        let (mut t, clock, _) = tracker();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        t.set_listener(move |e| sink.borrow_mut().push(e.clone()));

        t.start();
        let returned = run_minutes(&mut t, &clock, 15);
        assert_eq!(*seen.borrow(), returned);
        assert!(seen
            .borrow()
            .iter()
            .any(|e| matches!(e, Event::GentleReminder { session_minutes: 15, .. })));

        t.release();
        let count = seen.borrow().len();
        assert!(run_minutes(&mut t, &clock, 20).is_empty());
        assert_eq!(seen.borrow().len(), count);
    }

    #[test]
    fn statistics_average_over_study_days() {
        let (mut t, clock, log) = tracker();
        log.add_minutes(clock.today() - Duration::days(1), 10);
        t.start();
        clock.advance_minutes(12);
        t.stop();
        t.start();
        clock.advance_minutes(8);

        let stats = t.statistics();
        assert_eq!(stats.today_minutes, 20);
        assert_eq!(stats.session_minutes, 8);
        assert_eq!(stats.total_days, 2);
        assert_eq!(stats.average_minutes_per_day, 15);
        assert!(stats.is_healthy_duration);

        clock.advance_minutes(1);
        assert!(!t.statistics().is_healthy_duration);
    }

    #[test]
    fn statistics_count_an_unrecorded_today_once() {
        let (mut t, clock, log) = tracker();
        log.add_minutes(clock.today() - Duration::days(2), 10);
        log.add_minutes(clock.today() - Duration::days(1), 30);
        t.start();
        clock.advance_minutes(20);

        let stats = t.statistics();
        assert_eq!(stats.total_days, 2);
        assert_eq!(stats.average_minutes_per_day, 20);
    }

    #[test]
    fn statistics_without_history_average_the_live_session() {
        let (mut t, clock, _) = tracker();
        assert_eq!(t.statistics().average_minutes_per_day, 0);
        t.start();
        clock.advance_minutes(9);
        assert_eq!(t.statistics().average_minutes_per_day, 9);
    }

    #[test]
    fn snapshot_restores_running_session() {
        let (mut t, clock, log) = tracker();
        t.start();
        clock.advance_minutes(6);
        t.tick();
        let json = serde_json::to_string(&t.snapshot()).unwrap();

        let snapshot: TrackerSnapshot = serde_json::from_str(&json).unwrap();
        let mut restored =
            StudyTimeTracker::restore(TrackerSettings::default(), clock.clone(), log, snapshot);
        clock.advance_minutes(9);
        assert_eq!(restored.state(), TrackerState::Studying);
        let events = restored.tick();
        assert_eq!(reminders(&events), vec![(ReminderTier::Gentle, 15)]);
    }

    #[test]
    fn countdown_format() {
        assert_eq!(format_countdown(Duration::seconds(300)), "5:00");
        assert_eq!(format_countdown(Duration::seconds(61)), "1:01");
        assert_eq!(format_countdown(Duration::milliseconds(299_500)), "5:00");
        assert_eq!(format_countdown(Duration::seconds(-3)), "0:00");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Start,
            Pause,
            Advance(i64),
            Tick,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Start),
                Just(Op::Pause),
                (1i64..600).prop_map(Op::Advance),
                Just(Op::Tick),
            ]
        }

        proptest! {
            #[test]
            fn session_minutes_never_decrease(ops in prop::collection::vec(op(), 1..60)) {
                let settings = TrackerSettings {
                    force_minutes: 10_000,
                    strong_minutes: 10_000,
                    ..TrackerSettings::default()
                };
                let clock = Rc::new(ManualClock::new(t0()));
                let mut t = StudyTimeTracker::new(settings, clock.clone(), MemoryStudyLog::new());
                let mut last = 0;
                for op in ops {
                    match op {
                        Op::Start => { t.start(); }
                        Op::Pause => { t.pause(); }
                        Op::Advance(secs) => clock.advance(Duration::seconds(secs)),
                        Op::Tick => { t.tick(); }
                    }
                    let now = t.session_minutes();
                    prop_assert!(now >= last);
                    last = now;
                }
            }

            #[test]
            fn paused_span_is_excluded(study in 0i64..120, paused in 0i64..240, more in 0i64..120) {
                let clock = Rc::new(ManualClock::new(t0()));
                let mut t = StudyTimeTracker::new(
                    TrackerSettings::default(),
                    clock.clone(),
                    MemoryStudyLog::new(),
                );
                t.start();
                clock.advance_minutes(study);
                t.pause();
                clock.advance_minutes(paused);
                t.start();
                clock.advance_minutes(more);
                prop_assert_eq!(t.stop(), (study + more) as u64);
            }
        }
    }
}
