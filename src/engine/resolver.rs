//! Mutations on day files whose events carry no primary key.
//!
//! A client names the event it wants to change by staff id plus the values it
//! last saw. Matching is best-effort: duplicates resolve to the first match in
//! file order, and a stale view falls back to the staff member's first event.

use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::engine::DelayEngine;
use crate::error::{EngineError, EngineResult};
use crate::model::attendance::{AttendanceEvent, DayFile, DelayResult, Stamp};
use crate::model::mutation::{
    AddAttendance, DeleteAttendance, DeleteSpecificAttendance, MatchedBy, MutationOutcome,
    UpdateAttendance,
};
use crate::model::staff::StaffId;
use crate::store::DayStore;
use crate::utils::time_utils::{TIME_OF_DAY_FORMAT, parse_date, parse_time_of_day};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CheckinUpdate,
    CheckoutUpdate,
}

/// Values the client claims an event currently has, as `HH:MM:SS` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedValues {
    pub checkin: String,
    pub checkout: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched { index: usize, candidates: usize },
    Fallback { index: usize },
    NotFound,
}

/// New value for one side of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEdit {
    Clear,
    Set(NaiveTime),
}

impl TimeEdit {
    fn stamp_on(self, date: NaiveDate) -> Stamp {
        match self {
            TimeEdit::Clear => Stamp::empty(),
            TimeEdit::Set(t) => Stamp::at(date.and_time(t)),
        }
    }
}

/// Find the event an update is aimed at.
pub fn resolve(
    day: &DayFile,
    staff: &StaffId,
    kind: MutationKind,
    expected: &ExpectedValues,
) -> Resolution {
    let positions = day.positions_for(staff);
    let Some(&first) = positions.first() else {
        return Resolution::NotFound;
    };

    let matches: Vec<usize> = positions
        .into_iter()
        .filter(|&i| {
            let event = &day.events[i];
            match kind {
                MutationKind::CheckinUpdate => event.checkin_time_text() == expected.checkin,
                MutationKind::CheckoutUpdate => {
                    event.checkout_time_text() == expected.checkout
                        && (expected.checkin.is_empty()
                            || event.checkin_time_text() == expected.checkin)
                }
            }
        })
        .collect();

    match matches.first() {
        Some(&index) => Resolution::Matched {
            index,
            candidates: matches.len(),
        },
        None => Resolution::Fallback { index: first },
    }
}

/// Validated form of [`UpdateAttendance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub staff: StaffId,
    pub date: NaiveDate,
    pub kind: MutationKind,
    pub expected: ExpectedValues,
    pub checkin: Option<TimeEdit>,
    pub checkout: Option<TimeEdit>,
}

fn required_key(staff_id: &str, date: &str) -> EngineResult<(StaffId, NaiveDate)> {
    let staff = StaffId::new(staff_id);
    if staff.is_empty() || date.trim().is_empty() {
        return Err(EngineError::Validation(
            "Staff ID and date are required".to_string(),
        ));
    }
    let date = parse_date(date).ok_or_else(|| {
        EngineError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", date.trim()))
    })?;
    Ok((staff, date))
}

fn time_edit(value: Option<&str>, label: &str) -> EngineResult<Option<TimeEdit>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Ok(Some(TimeEdit::Clear));
    }
    parse_time_of_day(value)
        .map(|t| Some(TimeEdit::Set(t)))
        .ok_or_else(|| EngineError::Validation(format!("Invalid {label} time format. Use HH:MM:SS")))
}

/// A claimed current value, re-rendered so `9:05:00` and `09:05:00` compare equal.
fn expected_time(value: Option<&str>, label: &str) -> EngineResult<String> {
    let value = value.unwrap_or("").trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    parse_time_of_day(value)
        .map(|t| t.format(TIME_OF_DAY_FORMAT).to_string())
        .ok_or_else(|| {
            EngineError::Validation(format!("Invalid current {label} time format. Use HH:MM:SS"))
        })
}

impl UpdatePlan {
    pub fn from_request(req: &UpdateAttendance) -> EngineResult<Self> {
        let (staff, date) = required_key(&req.staff_id, &req.date)?;
        let checkin = time_edit(req.checkin.as_deref(), "check-in")?;
        let checkout = time_edit(req.checkout.as_deref(), "check-out")?;

        let kind = match (&checkin, &checkout) {
            (Some(_), _) => MutationKind::CheckinUpdate,
            (None, Some(_)) => MutationKind::CheckoutUpdate,
            (None, None) => {
                return Err(EngineError::Validation(
                    "Nothing to update: supply checkin or checkout".to_string(),
                ));
            }
        };

        let expected = ExpectedValues {
            checkin: expected_time(req.current_checkin.as_deref(), "check-in")?,
            checkout: expected_time(req.current_checkout.as_deref(), "check-out")?,
        };

        Ok(Self {
            staff,
            date,
            kind,
            expected,
            checkin,
            checkout,
        })
    }
}

fn sort_by_staff_and_checkin(day: &mut DayFile) {
    day.events
        .sort_by_cached_key(|e| (e.staff_key(), e.checkin_sort_key()));
}

fn sort_by_staff(day: &mut DayFile) {
    day.events.sort_by_cached_key(|e| e.staff_key());
}

fn new_event(engine: &DelayEngine, staff: &StaffId) -> AttendanceEvent {
    AttendanceEvent::placeholder(staff, &engine.profiles().name_of(staff))
}

/// Apply an update to an in-memory day. Synthesizes an event when the staff
/// member has none.
pub fn apply_update(engine: &DelayEngine, day: &mut DayFile, plan: &UpdatePlan) -> MutationOutcome {
    let resolution = resolve(day, &plan.staff, plan.kind, &plan.expected);

    let (index, matched_by, candidates) = match resolution {
        Resolution::Matched { index, candidates } => (index, MatchedBy::Value, candidates),
        Resolution::Fallback { index } => {
            warn!(
                staff_id = %plan.staff,
                date = %plan.date,
                "No event matched the client's current values; using the first event"
            );
            (index, MatchedBy::FirstForStaff, 0)
        }
        Resolution::NotFound => {
            day.events.push(new_event(engine, &plan.staff));
            (day.events.len() - 1, MatchedBy::Synthesized, 0)
        }
    };

    let target = &mut day.events[index];
    if let Some(edit) = plan.checkin {
        target.checkin = Some(edit.stamp_on(plan.date));
    }
    if let Some(edit) = plan.checkout {
        target.checkout = Some(edit.stamp_on(plan.date));
    }

    sort_by_staff_and_checkin(day);
    let delay = engine.reapply(day, &plan.staff);

    MutationOutcome {
        matched_by: Some(matched_by),
        candidates: Some(candidates),
        delay: delay.map(|d| d.to_string()),
        ..MutationOutcome::ok("Attendance updated successfully")
    }
}

pub fn apply_add(
    engine: &DelayEngine,
    day: &mut DayFile,
    staff: &StaffId,
    checkin: Option<TimeEdit>,
    checkout: Option<TimeEdit>,
) -> MutationOutcome {
    let mut event = new_event(engine, staff);
    if let Some(edit) = checkin {
        event.checkin = Some(edit.stamp_on(day.date));
    }
    if let Some(edit) = checkout {
        event.checkout = Some(edit.stamp_on(day.date));
    }
    day.events.push(event);

    sort_by_staff_and_checkin(day);
    let delay = engine.reapply(day, staff);

    MutationOutcome {
        delay: delay.map(|d| d.to_string()),
        ..MutationOutcome::ok(format!("Successfully added new record for {staff}"))
    }
}

/// Remove all of a staff member's events, leaving one placeholder.
pub fn apply_delete_all(
    engine: &DelayEngine,
    day: &mut DayFile,
    staff: &StaffId,
) -> EngineResult<MutationOutcome> {
    let before = day.events.len();
    day.events.retain(|e| &e.staff_key() != staff);
    let removed = before - day.events.len();

    if removed == 0 {
        return Err(EngineError::NotFound(format!(
            "No records found for staff {staff} on {}",
            day.date
        )));
    }

    day.events.push(new_event(engine, staff));
    sort_by_staff(day);

    Ok(MutationOutcome {
        deleted_count: Some(removed),
        placeholder_created: true,
        delay: Some(DelayResult::NotAvailable.to_string()),
        ..MutationOutcome::ok(format!(
            "Successfully deleted {removed} record(s) for {staff} and created placeholder record"
        ))
    })
}

/// Remove the `position`-th event (in file order) of a staff member.
pub fn apply_delete_one(
    engine: &DelayEngine,
    day: &mut DayFile,
    staff: &StaffId,
    position: usize,
) -> EngineResult<MutationOutcome> {
    let positions = day.positions_for(staff);
    if positions.is_empty() {
        return Err(EngineError::NotFound(format!("No records found for staff {staff}")));
    }
    let Some(&index) = positions.get(position) else {
        return Err(EngineError::Validation("Invalid record index".to_string()));
    };

    day.events.remove(index);

    let placeholder_created = !day.has_staff(staff);
    let delay = if placeholder_created {
        day.events.push(new_event(engine, staff));
        None
    } else {
        engine.reapply(day, staff)
    };
    sort_by_staff(day);

    Ok(MutationOutcome {
        deleted_count: Some(1),
        placeholder_created,
        delay: delay.map(|d| d.to_string()),
        ..MutationOutcome::ok(format!("Successfully deleted record for {staff}"))
    })
}

/// Runs mutations against the store designated as authoritative for writes.
#[derive(Debug, Clone)]
pub struct RecordResolver {
    engine: DelayEngine,
    store: Arc<DayStore>,
}

impl RecordResolver {
    pub fn new(engine: DelayEngine, store: Arc<DayStore>) -> Self {
        Self { engine, store }
    }

    fn existing_day(&self, date: NaiveDate) -> EngineResult<DayFile> {
        self.store.try_read_day(date)?.ok_or_else(|| {
            EngineError::NotFound(format!("Attendance file for {date} not found"))
        })
    }

    #[instrument(name = "attendance_update", skip(self, req), fields(staff_id = %req.staff_id, date = %req.date))]
    pub fn update(&self, req: &UpdateAttendance) -> EngineResult<MutationOutcome> {
        let plan = UpdatePlan::from_request(req)?;

        let _guard = self.store.lock();
        let mut day = self.existing_day(plan.date)?;
        let outcome = apply_update(&self.engine, &mut day, &plan);
        self.store.write_day(&day)?;

        info!(matched_by = ?outcome.matched_by, candidates = ?outcome.candidates, "Attendance updated");
        Ok(outcome)
    }

    #[instrument(name = "attendance_add", skip(self, req), fields(staff_id = %req.staff_id, date = %req.date))]
    pub fn add(&self, req: &AddAttendance) -> EngineResult<MutationOutcome> {
        let (staff, date) = required_key(&req.staff_id, &req.date)?;
        let checkin = time_edit(req.checkin.as_deref(), "check-in")?;
        let checkout = time_edit(req.checkout.as_deref(), "check-out")?;

        let _guard = self.store.lock();
        let mut day = self
            .store
            .try_read_day(date)?
            .unwrap_or_else(|| DayFile::empty(date));
        let outcome = apply_add(&self.engine, &mut day, &staff, checkin, checkout);
        self.store.write_day(&day)?;

        info!("Attendance record added");
        Ok(outcome)
    }

    #[instrument(name = "attendance_delete", skip(self, req), fields(staff_id = %req.staff_id, date = %req.date))]
    pub fn delete_all(&self, req: &DeleteAttendance) -> EngineResult<MutationOutcome> {
        let (staff, date) = required_key(&req.staff_id, &req.date)?;

        let _guard = self.store.lock();
        let mut day = self.existing_day(date)?;
        let outcome = apply_delete_all(&self.engine, &mut day, &staff)?;
        self.store.write_day(&day)?;

        info!(deleted = ?outcome.deleted_count, "Attendance records deleted");
        Ok(outcome)
    }

    #[instrument(name = "attendance_delete_specific", skip(self, req), fields(staff_id = %req.staff_id, date = %req.date, index = req.record_index))]
    pub fn delete_one(&self, req: &DeleteSpecificAttendance) -> EngineResult<MutationOutcome> {
        let (staff, date) = required_key(&req.staff_id, &req.date)?;

        let _guard = self.store.lock();
        let mut day = self.existing_day(date)?;
        let outcome = apply_delete_one(&self.engine, &mut day, &staff, req.record_index)?;
        self.store.write_day(&day)?;

        info!(placeholder = outcome.placeholder_created, "Attendance record deleted");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::ProfileTable;
    use crate::engine::delay::DelayCalculator;
    use crate::model::staff::StaffProfile;
    use std::collections::HashMap;

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()
    }

    fn engine() -> DelayEngine {
        let mut raw = HashMap::new();
        raw.insert(
            "T1".to_string(),
            StaffProfile {
                name: "Asha".into(),
                category: "Teaching Faculty".into(),
                ..Default::default()
            },
        );
        DelayEngine::new(Arc::new(ProfileTable::from_entries(raw)), DelayCalculator::default())
    }

    fn event(staff: &str, checkin: &str, checkout: &str) -> AttendanceEvent {
        let stamp = |t: &str| {
            if t.is_empty() {
                Stamp::empty()
            } else {
                Stamp::Text(format!("{}T{t}", tuesday()))
            }
        };
        AttendanceEvent {
            staff_id: staff.into(),
            name: None,
            checkin: Some(stamp(checkin)),
            checkout: Some(stamp(checkout)),
            delay: None,
            extra: Default::default(),
        }
    }

    fn day(events: Vec<AttendanceEvent>) -> DayFile {
        DayFile {
            date: tuesday(),
            events,
        }
    }

    fn expected(checkin: &str, checkout: &str) -> ExpectedValues {
        ExpectedValues {
            checkin: checkin.into(),
            checkout: checkout.into(),
        }
    }

    #[test]
    fn duplicate_values_resolve_to_first_in_order() {
        let mut first = event("t1", "09:40:00", "");
        first.extra.insert("seq".into(), 1.into());
        let mut second = event("t1", "09:40:00", "");
        second.extra.insert("seq".into(), 2.into());
        let d = day(vec![event("t0", "09:40:00", ""), first, second]);

        let r = resolve(&d, &"T1".into(), MutationKind::CheckinUpdate, &expected("09:40:00", ""));

        assert_eq!(r, Resolution::Matched { index: 1, candidates: 2 });
        assert_eq!(r, resolve(&d, &"T1".into(), MutationKind::CheckinUpdate, &expected("09:40:00", "")));
    }

    #[test]
    fn checkout_match_also_checks_supplied_checkin() {
        let d = day(vec![
            event("t1", "09:00:00", "12:00:00"),
            event("t1", "13:00:00", "12:00:00"),
        ]);

        let r = resolve(&d, &"T1".into(), MutationKind::CheckoutUpdate, &expected("13:00:00", "12:00:00"));
        assert_eq!(r, Resolution::Matched { index: 1, candidates: 1 });

        let r = resolve(&d, &"T1".into(), MutationKind::CheckoutUpdate, &expected("", "12:00:00"));
        assert_eq!(r, Resolution::Matched { index: 0, candidates: 2 });
    }

    #[test]
    fn stale_view_falls_back_to_first_event() {
        let d = day(vec![event("x", "", ""), event("t1", "10:00:00", ""), event("t1", "11:00:00", "")]);
        let r = resolve(&d, &"T1".into(), MutationKind::CheckinUpdate, &expected("08:00:00", ""));
        assert_eq!(r, Resolution::Fallback { index: 1 });
        let r = resolve(&d, &"nobody".into(), MutationKind::CheckinUpdate, &expected("", ""));
        assert_eq!(r, Resolution::NotFound);
    }

    #[test]
    fn update_rewrites_value_and_recomputes_delay() {
        let mut d = day(vec![event("t1", "09:40:00", "16:30:00")]);
        let plan = UpdatePlan::from_request(&UpdateAttendance {
            staff_id: "t1".into(),
            date: "2025-01-07".into(),
            checkin: Some("09:20:00".into()),
            current_checkin: Some("09:40:00".into()),
            ..Default::default()
        })
        .unwrap();

        let outcome = apply_update(&engine(), &mut d, &plan);

        assert_eq!(outcome.matched_by, Some(MatchedBy::Value));
        assert_eq!(outcome.delay.as_deref(), Some("00:00:00"));
        assert_eq!(d.events[0].checkin_time_text(), "09:20:00");
        assert_eq!(d.events[0].delay, Some(DelayResult::Duration(0)));
    }

    #[test]
    fn update_for_unknown_staff_synthesizes_an_event() {
        let mut d = day(vec![event("t2", "09:00:00", "")]);
        let plan = UpdatePlan::from_request(&UpdateAttendance {
            staff_id: "t1".into(),
            date: "2025-01-07".into(),
            checkout: Some("16:00:00".into()),
            ..Default::default()
        })
        .unwrap();

        let outcome = apply_update(&engine(), &mut d, &plan);

        assert_eq!(outcome.matched_by, Some(MatchedBy::Synthesized));
        assert_eq!(d.events.len(), 2);
        assert_eq!(d.events[0].staff_id, "T1");
        assert_eq!(d.events[0].name.as_deref(), Some("Asha"));
        assert_eq!(d.events[0].delay, Some(DelayResult::Duration(0)));
    }

    #[test]
    fn invalid_times_are_validation_errors() {
        let bad_new = UpdateAttendance {
            staff_id: "t1".into(),
            date: "2025-01-07".into(),
            checkin: Some("9.40".into()),
            ..Default::default()
        };
        assert!(matches!(UpdatePlan::from_request(&bad_new), Err(EngineError::Validation(_))));

        let bad_current = UpdateAttendance {
            checkin: Some("09:40:00".into()),
            current_checkin: Some("late".into()),
            ..bad_new.clone()
        };
        assert!(matches!(UpdatePlan::from_request(&bad_current), Err(EngineError::Validation(_))));

        let nothing = UpdateAttendance {
            checkin: None,
            ..bad_new.clone()
        };
        assert!(matches!(UpdatePlan::from_request(&nothing), Err(EngineError::Validation(_))));

        let no_date = UpdateAttendance {
            date: "".into(),
            ..bad_new
        };
        assert!(matches!(UpdatePlan::from_request(&no_date), Err(EngineError::Validation(_))));
    }

    #[test]
    fn deleting_only_event_leaves_one_placeholder() {
        let mut d = day(vec![event("t2", "09:00:00", ""), event("t1", "09:40:00", "")]);

        let outcome = apply_delete_one(&engine(), &mut d, &"T1".into(), 0).unwrap();

        assert!(outcome.placeholder_created);
        let staff = StaffId::new("T1");
        let t1: Vec<_> = d.events_for(&staff).collect();
        assert_eq!(t1.len(), 1);
        assert_eq!(t1[0].delay, Some(DelayResult::NotAvailable));
        assert_eq!(t1[0].checkin, Some(Stamp::empty()));
        assert_eq!(d.events[0].staff_key(), StaffId::new("T1"));
    }

    #[test]
    fn deleting_one_of_several_recomputes_the_rest() {
        let mut d = day(vec![event("t1", "09:00:00", ""), event("t1", "09:40:00", "16:30:00")]);

        let outcome = apply_delete_one(&engine(), &mut d, &"T1".into(), 0).unwrap();

        assert!(!outcome.placeholder_created);
        assert_eq!(d.events.len(), 1);
        assert_eq!(d.events[0].delay, Some(DelayResult::Duration(900)));
        assert!(matches!(
            apply_delete_one(&engine(), &mut d, &"T1".into(), 5),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            apply_delete_one(&engine(), &mut d, &"ZZ".into(), 0),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn delete_all_replaces_with_placeholder() {
        let mut d = day(vec![event("t1", "09:00:00", ""), event("t1", "13:00:00", ""), event("a", "", "")]);

        let outcome = apply_delete_all(&engine(), &mut d, &"T1".into()).unwrap();

        assert_eq!(outcome.deleted_count, Some(2));
        assert_eq!(d.events.len(), 2);
        assert_eq!(d.events[1].staff_id, "T1");
        assert_eq!(d.events[1].delay, Some(DelayResult::NotAvailable));
        assert!(matches!(
            apply_delete_all(&engine(), &mut d, &"ZZ".into()),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn resolver_round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DayStore::new(dir.path()));
        let resolver = RecordResolver::new(engine(), store.clone());

        let missing = resolver.update(&UpdateAttendance {
            staff_id: "t1".into(),
            date: "2025-01-07".into(),
            checkin: Some("09:00:00".into()),
            ..Default::default()
        });
        assert!(matches!(missing, Err(EngineError::NotFound(_))));

        resolver
            .add(&AddAttendance {
                staff_id: "t1".into(),
                date: "2025-01-07".into(),
                checkin: Some("09:40:00".into()),
                checkout: Some("16:30:00".into()),
            })
            .unwrap();

        let outcome = resolver
            .update(&UpdateAttendance {
                staff_id: "T1".into(),
                date: "2025-01-07".into(),
                checkout: Some("16:00:00".into()),
                current_checkin: Some("09:40:00".into()),
                current_checkout: Some("16:30:00".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(outcome.candidates, Some(1));
        assert_eq!(outcome.delay.as_deref(), Some("00:45:00"));

        let on_disk = store.read_day(tuesday());
        assert_eq!(on_disk.events.len(), 1);
        assert_eq!(on_disk.events[0].delay, Some(DelayResult::Duration(2700)));

        let bad = resolver.add(&AddAttendance {
            staff_id: "t1".into(),
            date: "2025-01-07".into(),
            checkin: Some("nine".into()),
            checkout: None,
        });
        assert!(matches!(bad, Err(EngineError::Validation(_))));
        assert_eq!(store.read_day(tuesday()).events.len(), 1);
    }
}
