pub mod annotate;
pub mod classifier;
pub mod delay;
pub mod policy;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod sync;

use chrono::NaiveDate;
use std::sync::Arc;

use crate::model::attendance::{AttendanceEvent, DayFile, DelayResult};
use crate::model::staff::{PolicyCategory, StaffId};

use classifier::ProfileTable;
use delay::DelayCalculator;

/// Classifier plus calculator: everything needed to put a delay on a person's day.
#[derive(Debug, Clone)]
pub struct DelayEngine {
    profiles: Arc<ProfileTable>,
    calculator: DelayCalculator,
}

impl DelayEngine {
    pub fn new(profiles: Arc<ProfileTable>, calculator: DelayCalculator) -> Self {
        Self {
            profiles,
            calculator,
        }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn classify(&self, staff: &StaffId) -> PolicyCategory {
        self.profiles.classify(staff)
    }

    pub fn delay_for<'a, I>(&self, staff: &StaffId, events: I, date: NaiveDate) -> DelayResult
    where
        I: IntoIterator<Item = &'a AttendanceEvent>,
    {
        self.calculator.compute(events, date, self.classify(staff))
    }

    /// Recompute one person's delay and write it onto each of their events.
    pub fn reapply(&self, day: &mut DayFile, staff: &StaffId) -> Option<DelayResult> {
        if !day.has_staff(staff) {
            return None;
        }
        let delay = self.delay_for(staff, day.events_for(staff), day.date);
        for event in day.events.iter_mut().filter(|e| &e.staff_key() == staff) {
            event.delay = Some(delay);
        }
        Some(delay)
    }
}
