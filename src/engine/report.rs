//! Read-only views over day files: the daily listing and the monthly reports.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::engine::DelayEngine;
use crate::error::{EngineError, EngineResult};
use crate::model::attendance::{DayFile, DelayResult, SENTINEL_ABSENT, SENTINEL_NOT_AVAILABLE};
use crate::model::staff::StaffId;
use crate::store::DayStore;
use crate::utils::time_utils::{DATE_FORMAT, TIME_OF_DAY_FORMAT, format_hhmmss};

pub const NOT_RECORDED: &str = "Not recorded";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ListingRow {
    #[schema(example = "BBH042")]
    pub staff_id: String,
    #[schema(example = "A. Kamath")]
    pub name: String,
    /// `HH:MM:SS`, empty when missing.
    #[schema(example = "09:40:00")]
    pub checkin: String,
    #[schema(example = "16:30:00")]
    pub checkout: String,
    #[schema(example = "00:15:00")]
    pub delay: String,
    /// Position among this staff member's events, as used by delete-specific.
    /// Absent on synthesized rows.
    pub record_index: Option<usize>,
}

/// Map a computed delay to what a listing shows for one row.
pub fn display_delay(checkin: &str, checkout: &str, delay: Option<DelayResult>) -> String {
    if checkin.is_empty() || checkout.is_empty() {
        return SENTINEL_ABSENT.to_string();
    }
    match delay {
        Some(d @ DelayResult::Duration(_)) => d.to_string(),
        _ => format_hhmmss(0),
    }
}

/// The day's events with live delays, plus a row for every profiled staff
/// member without events. Sorted by staff id.
pub fn daily_listing(engine: &DelayEngine, day: &DayFile) -> Vec<ListingRow> {
    let delays: BTreeMap<StaffId, DelayResult> = day
        .staff_ids()
        .into_iter()
        .filter(|id| !id.is_empty())
        .map(|id| {
            let delay = engine.delay_for(&id, day.events_for(&id), day.date);
            (id, delay)
        })
        .collect();

    let mut seen: BTreeMap<StaffId, usize> = BTreeMap::new();
    let mut rows: Vec<ListingRow> = day
        .events
        .iter()
        .map(|event| {
            let key = event.staff_key();
            let index = seen.entry(key.clone()).or_default();
            let record_index = *index;
            *index += 1;

            let checkin = event.checkin_time_text();
            let checkout = event.checkout_time_text();
            let delay = display_delay(&checkin, &checkout, delays.get(&key).copied());
            let name = match event.name.as_deref() {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => engine.profiles().name_of(&key),
            };
            ListingRow {
                staff_id: key.to_string(),
                name,
                checkin,
                checkout,
                delay,
                record_index: Some(record_index),
            }
        })
        .collect();

    for id in engine.profiles().ids() {
        if seen.contains_key(&id) {
            continue;
        }
        rows.push(ListingRow {
            name: engine.profiles().name_of(&id),
            staff_id: id.to_string(),
            checkin: String::new(),
            checkout: String::new(),
            delay: display_delay("", "", Some(DelayResult::NotAvailable)),
            record_index: None,
        });
    }

    rows.sort_by(|a, b| a.staff_id.cmp(&b.staff_id));
    rows
}

/// Every date of a calendar month.
pub fn month_days(year: i32, month: u32) -> EngineResult<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("Invalid month {month}/{year}")))?;
    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect())
}

fn load_month(store: &DayStore, year: i32, month: u32) -> EngineResult<Vec<DayFile>> {
    Ok(month_days(year, month)?
        .into_iter()
        .map(|date| store.read_day(date))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyDelayRow {
    #[schema(example = "BBH042")]
    pub staff_id: String,
    pub name: String,
    /// Sum over days with records, or `N/A` when there were none.
    #[schema(example = "01:25:00")]
    pub total_delay: String,
}

pub fn monthly_delay(
    engine: &DelayEngine,
    store: &DayStore,
    year: i32,
    month: u32,
) -> EngineResult<Vec<MonthlyDelayRow>> {
    let days = load_month(store, year, month)?;

    Ok(engine
        .profiles()
        .ids()
        .into_iter()
        .map(|id| {
            let mut total: i64 = 0;
            let mut days_with_records = 0;
            for day in &days {
                if !day.has_staff(&id) {
                    continue;
                }
                days_with_records += 1;
                if let Some(s) = engine.delay_for(&id, day.events_for(&id), day.date).seconds() {
                    total = total.saturating_add(s);
                }
            }
            MonthlyDelayRow {
                name: engine.profiles().name_of(&id),
                staff_id: id.to_string(),
                total_delay: if days_with_records == 0 {
                    SENTINEL_NOT_AVAILABLE.to_string()
                } else {
                    format_hhmmss(total)
                },
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayDetail {
    #[schema(example = "2025-01-07")]
    pub date: String,
    #[schema(example = "09:40:00")]
    pub checkin: String,
    #[schema(example = "16:30:00")]
    pub checkout: String,
    #[schema(example = "00:15:00")]
    pub delay: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StaffDetailReport {
    pub staff_id: String,
    pub name: String,
    pub days: Vec<DayDetail>,
    pub total_delay: String,
}

/// `all`, or a single staff id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffSelector {
    All,
    One(StaffId),
}

impl StaffSelector {
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EngineError::Validation("Staff is required".to_string()));
        }
        if raw.eq_ignore_ascii_case("all") {
            Ok(StaffSelector::All)
        } else {
            Ok(StaffSelector::One(StaffId::new(raw)))
        }
    }
}

fn day_detail(engine: &DelayEngine, id: &StaffId, day: &DayFile) -> (DayDetail, i64) {
    let date = day.date.format(DATE_FORMAT).to_string();
    if !day.has_staff(id) {
        return (
            DayDetail {
                date,
                checkin: NOT_RECORDED.to_string(),
                checkout: NOT_RECORDED.to_string(),
                delay: format_hhmmss(0),
            },
            0,
        );
    }

    let earliest = day.events_for(id).filter_map(|e| e.checkin_at()).min();
    let latest = day.events_for(id).filter_map(|e| e.checkout_at()).max();
    let delay = engine.delay_for(id, day.events_for(id), day.date);

    let shown = if earliest.is_none() && latest.is_none() {
        SENTINEL_ABSENT.to_string()
    } else {
        delay.to_string()
    };
    let render = |t: Option<chrono::NaiveDateTime>| {
        t.map(|t| t.format(TIME_OF_DAY_FORMAT).to_string())
            .unwrap_or_else(|| NOT_RECORDED.to_string())
    };

    (
        DayDetail {
            date,
            checkin: render(earliest),
            checkout: render(latest),
            delay: shown,
        },
        delay.seconds().unwrap_or(0),
    )
}

pub fn staff_detail(
    engine: &DelayEngine,
    store: &DayStore,
    year: i32,
    month: u32,
    selector: &StaffSelector,
) -> EngineResult<Vec<StaffDetailReport>> {
    let days = load_month(store, year, month)?;
    let targets = match selector {
        StaffSelector::All => engine.profiles().ids(),
        StaffSelector::One(id) => vec![id.clone()],
    };

    Ok(targets
        .into_iter()
        .map(|id| {
            let mut total: i64 = 0;
            let details = days
                .iter()
                .map(|day| {
                    let (detail, seconds) = day_detail(engine, &id, day);
                    total = total.saturating_add(seconds);
                    detail
                })
                .collect();
            StaffDetailReport {
                name: engine.profiles().name_of(&id),
                staff_id: id.to_string(),
                days: details,
                total_delay: format_hhmmss(total),
            }
        })
        .collect())
}
