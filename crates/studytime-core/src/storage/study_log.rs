//! The daily study record as seen by the tracker.
//!
//! Implementations own the storage format and deal with their own
//! failures; every method here is infallible from the caller's side.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDate;

use crate::timer::Clock;

pub trait StudyLog {
    /// Add minutes to the record for `date`, creating it if needed.
    fn add_minutes(&self, date: NaiveDate, minutes: u64);

    fn minutes_on(&self, date: NaiveDate) -> u64;

    /// Number of distinct days with a record.
    fn total_study_days(&self) -> u64;

    fn total_minutes(&self) -> u64;

    /// Whether `date` has a record, even one of zero minutes.
    fn studied_on(&self, date: NaiveDate) -> bool {
        self.minutes_on(date) > 0
    }

    fn minutes_for_today(&self, clock: &dyn Clock) -> u64 {
        self.minutes_on(clock.today())
    }
}

impl<L: StudyLog + ?Sized> StudyLog for &L {
    fn add_minutes(&self, date: NaiveDate, minutes: u64) {
        (**self).add_minutes(date, minutes)
    }

    fn minutes_on(&self, date: NaiveDate) -> u64 {
        (**self).minutes_on(date)
    }

    fn studied_on(&self, date: NaiveDate) -> bool {
        (**self).studied_on(date)
    }

    fn total_study_days(&self) -> u64 {
        (**self).total_study_days()
    }

    fn total_minutes(&self) -> u64 {
        (**self).total_minutes()
    }
}

impl<L: StudyLog + ?Sized> StudyLog for Rc<L> {
    fn add_minutes(&self, date: NaiveDate, minutes: u64) {
        (**self).add_minutes(date, minutes)
    }

    fn minutes_on(&self, date: NaiveDate) -> u64 {
        (**self).minutes_on(date)
    }

    fn studied_on(&self, date: NaiveDate) -> bool {
        (**self).studied_on(date)
    }

    fn total_study_days(&self) -> u64 {
        (**self).total_study_days()
    }

    fn total_minutes(&self) -> u64 {
        (**self).total_minutes()
    }
}

/// In-process record, for tests and front ends without persistence.
#[derive(Debug, Default)]
pub struct MemoryStudyLog {
    days: RefCell<BTreeMap<NaiveDate, u64>>,
}

impl MemoryStudyLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StudyLog for MemoryStudyLog {
    fn add_minutes(&self, date: NaiveDate, minutes: u64) {
        *self.days.borrow_mut().entry(date).or_insert(0) += minutes;
    }

    fn minutes_on(&self, date: NaiveDate) -> u64 {
        self.days.borrow().get(&date).copied().unwrap_or(0)
    }

    fn studied_on(&self, date: NaiveDate) -> bool {
        self.days.borrow().contains_key(&date)
    }

    fn total_study_days(&self) -> u64 {
        self.days.borrow().len() as u64
    }

    fn total_minutes(&self) -> u64 {
        self.days.borrow().values().sum()
    }
}
