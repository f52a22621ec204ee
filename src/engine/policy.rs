use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::model::staff::PolicyCategory;

/// Required presence window for one category on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceWindow {
    /// Latest on-time arrival.
    pub deadline: NaiveTime,
    /// Earliest on-time departure.
    pub checkout_after: NaiveTime,
}

impl PresenceWindow {
    pub fn seconds(&self) -> i64 {
        (self.checkout_after - self.deadline).num_seconds().max(0)
    }

    pub fn bounds_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.deadline), date.and_time(self.checkout_after))
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Saturday is a short day; every other day uses the weekday table.
pub fn window(category: PolicyCategory, date: NaiveDate) -> PresenceWindow {
    let saturday = date.weekday() == Weekday::Sat;
    let (deadline, checkout_after) = match category {
        PolicyCategory::Teaching => (hm(9, 25), if saturday { hm(13, 0) } else { hm(16, 30) }),
        PolicyCategory::Administrative => {
            (hm(9, 15), if saturday { hm(13, 30) } else { hm(17, 15) })
        }
        PolicyCategory::Support => (hm(8, 30), if saturday { hm(13, 30) } else { hm(17, 15) }),
    };
    PresenceWindow {
        deadline,
        checkout_after,
    }
}

/// Window used by the coverage model, which has no requirement on Sundays.
pub fn required_window(category: PolicyCategory, date: NaiveDate) -> Option<PresenceWindow> {
    if date.weekday() == Weekday::Sun {
        None
    } else {
        Some(window(category, date))
    }
}
