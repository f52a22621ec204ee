use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};

use crate::engine::policy::{required_window, window};
use crate::model::attendance::{AttendanceEvent, DelayResult};
use crate::model::staff::PolicyCategory;
use crate::utils::time_utils::{ceil_millis, millis_between, round_millis};

/// Which delay policy a deployment applies. One per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DelayModel {
    /// Lateness at arrival plus earliness at departure.
    #[default]
    Deadline,
    /// Required window minus merged presence.
    Coverage,
}

/// Deadline-model result for a checkin without any checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
pub enum MissingCheckout {
    /// Report only the late-arrival component.
    #[default]
    #[strum(serialize = "late")]
    LateOnly,
    #[strum(serialize = "na", serialize = "n/a")]
    NotAvailable,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DelayCalculator {
    pub model: DelayModel,
    pub missing_checkout: MissingCheckout,
}

impl DelayCalculator {
    pub fn new(model: DelayModel, missing_checkout: MissingCheckout) -> Self {
        Self {
            model,
            missing_checkout,
        }
    }

    /// One delay value for all of a person's events on `date`.
    pub fn compute<'a, I>(&self, events: I, date: NaiveDate, category: PolicyCategory) -> DelayResult
    where
        I: IntoIterator<Item = &'a AttendanceEvent>,
    {
        match self.model {
            DelayModel::Deadline => deadline_delay(events, date, category, self.missing_checkout),
            DelayModel::Coverage => coverage_delay(events, date, category),
        }
    }
}

/// Earliest checkin against the deadline, latest checkout against the
/// checkout-after time. No checkin at all counts as zero delay.
pub fn deadline_delay<'a, I>(
    events: I,
    date: NaiveDate,
    category: PolicyCategory,
    missing_checkout: MissingCheckout,
) -> DelayResult
where
    I: IntoIterator<Item = &'a AttendanceEvent>,
{
    let mut earliest_in: Option<NaiveDateTime> = None;
    let mut latest_out: Option<NaiveDateTime> = None;
    for event in events {
        if let Some(ci) = event.checkin_at() {
            earliest_in = Some(earliest_in.map_or(ci, |cur| cur.min(ci)));
        }
        if let Some(co) = event.checkout_at() {
            latest_out = Some(latest_out.map_or(co, |cur| cur.max(co)));
        }
    }

    let Some(earliest_in) = earliest_in else {
        return DelayResult::zero();
    };

    let policy = window(category, date);
    let deadline = earliest_in.date().and_time(policy.deadline);
    let late = round_millis(millis_between(earliest_in, deadline));

    let Some(latest_out) = latest_out else {
        return match missing_checkout {
            MissingCheckout::LateOnly => DelayResult::Duration(late),
            MissingCheckout::NotAvailable => DelayResult::NotAvailable,
        };
    };

    let required = latest_out.date().and_time(policy.checkout_after);
    let early_leave = ceil_millis(millis_between(required, latest_out));

    DelayResult::Duration((late + early_leave).max(0))
}

/// Union of checkin/checkout pairs clamped to the day's window, subtracted
/// from the window length.
pub fn coverage_delay<'a, I>(events: I, date: NaiveDate, category: PolicyCategory) -> DelayResult
where
    I: IntoIterator<Item = &'a AttendanceEvent>,
{
    let Some(policy) = required_window(category, date) else {
        return DelayResult::zero();
    };
    let (start, end) = policy.bounds_on(date);

    let mut intervals: Vec<(NaiveDateTime, NaiveDateTime)> = events
        .into_iter()
        .filter_map(|e| Some((e.checkin_at()?, e.checkout_at()?)))
        .filter(|(from, to)| to > from)
        .map(|(from, to)| (from.max(start), to.min(end)))
        .filter(|(from, to)| to > from)
        .collect();

    let present_ms: i64 = merge_intervals(&mut intervals)
        .iter()
        .map(|(from, to)| millis_between(*to, *from))
        .sum();

    let required_ms = policy.seconds() * 1000;
    DelayResult::Duration(round_millis(required_ms - present_ms))
}

/// Classic interval union; sorts `intervals` in place.
pub fn merge_intervals(
    intervals: &mut [(NaiveDateTime, NaiveDateTime)],
) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    intervals.sort_by_key(|(from, _)| *from);

    let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::with_capacity(intervals.len());
    for &(from, to) in intervals.iter() {
        match merged.last_mut() {
            Some(last) if from <= last.1 => last.1 = last.1.max(to),
            _ => merged.push((from, to)),
        }
    }
    merged
}
