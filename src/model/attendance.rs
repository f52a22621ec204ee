use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::model::staff::StaffId;
use crate::utils::time_utils::{
    TIME_OF_DAY_FORMAT, format_hhmmss, parse_epoch, parse_hhmmss, parse_timestamp_str,
};

pub const SENTINEL_ABSENT: &str = "Absent";
pub const SENTINEL_NOT_AVAILABLE: &str = "N/A";

/// A checkin/checkout value as the upstream writer produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stamp {
    Epoch(Number),
    Text(String),
    /// `null` or any other JSON value, kept verbatim and never parsed.
    Other(Value),
}

impl From<Value> for Stamp {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => Stamp::Epoch(n),
            Value::String(s) => Stamp::Text(s),
            other => Stamp::Other(other),
        }
    }
}

impl Stamp {
    pub fn empty() -> Self {
        Stamp::Text(String::new())
    }

    pub fn at(dt: NaiveDateTime) -> Self {
        Stamp::Text(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn parse(&self) -> Option<NaiveDateTime> {
        match self {
            Stamp::Epoch(v) => v.as_f64().and_then(parse_epoch),
            Stamp::Text(s) => parse_timestamp_str(s),
            Stamp::Other(_) => None,
        }
    }

    /// Raw text used as a secondary sort key.
    pub fn sort_key(&self) -> String {
        match self {
            Stamp::Epoch(v) => v.to_string(),
            Stamp::Text(s) => s.clone(),
            Stamp::Other(_) => String::new(),
        }
    }
}

/// Per-person-per-day delay value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayResult {
    /// Whole seconds of delay.
    Duration(i64),
    Absent,
    NotAvailable,
}

impl DelayResult {
    pub fn zero() -> Self {
        DelayResult::Duration(0)
    }

    pub fn seconds(&self) -> Option<i64> {
        match self {
            DelayResult::Duration(s) => Some(*s),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            SENTINEL_ABSENT => Some(DelayResult::Absent),
            SENTINEL_NOT_AVAILABLE => Some(DelayResult::NotAvailable),
            other => parse_hhmmss(other).map(DelayResult::Duration),
        }
    }
}

impl fmt::Display for DelayResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayResult::Duration(s) => f.write_str(&format_hhmmss(*s)),
            DelayResult::Absent => f.write_str(SENTINEL_ABSENT),
            DelayResult::NotAvailable => f.write_str(SENTINEL_NOT_AVAILABLE),
        }
    }
}

impl Serialize for DelayResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Unrecognised delay text on disk is dropped rather than failing the whole file.
fn lenient_delay<'de, D>(deserializer: D) -> Result<Option<DelayResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => DelayResult::parse(&s),
        _ => None,
    })
}

/// Ids written as numbers are kept as their text; `null` or other values become empty.
fn lenient_staff_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// A stamp field that is present, even as `null`, stays `Some` so it is written back.
fn present_stamp<'de, D>(deserializer: D) -> Result<Option<Stamp>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(Stamp::from(v)))
}

/// One raw swipe record. Field order here is the on-disk field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEvent {
    /// The upstream writer calls this field `student_id`.
    #[serde(rename = "student_id", default, deserialize_with = "lenient_staff_id")]
    pub staff_id: String,

    #[serde(
        default,
        deserialize_with = "lenient_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    #[serde(
        default,
        deserialize_with = "present_stamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub checkin: Option<Stamp>,

    #[serde(
        default,
        deserialize_with = "present_stamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub checkout: Option<Stamp>,

    #[serde(
        default,
        deserialize_with = "lenient_delay",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay: Option<DelayResult>,

    /// Fields this service does not interpret (including legacy `timestamp`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceEvent {
    /// Placeholder keeping a staff member visible in a day with no usable swipes.
    pub fn placeholder(staff_id: &StaffId, name: &str) -> Self {
        Self {
            staff_id: staff_id.to_string(),
            name: Some(name.to_string()),
            checkin: Some(Stamp::empty()),
            checkout: Some(Stamp::empty()),
            delay: Some(DelayResult::NotAvailable),
            extra: Map::new(),
        }
    }

    pub fn staff_key(&self) -> StaffId {
        StaffId::new(&self.staff_id)
    }

    pub fn checkin_at(&self) -> Option<NaiveDateTime> {
        self.checkin.as_ref().and_then(Stamp::parse)
    }

    pub fn checkout_at(&self) -> Option<NaiveDateTime> {
        self.checkout.as_ref().and_then(Stamp::parse)
    }

    /// Checkin re-rendered as `HH:MM:SS`, or empty when missing or unparseable.
    pub fn checkin_time_text(&self) -> String {
        self.checkin_at()
            .map(|dt| dt.format(TIME_OF_DAY_FORMAT).to_string())
            .unwrap_or_default()
    }

    pub fn checkout_time_text(&self) -> String {
        self.checkout_at()
            .map(|dt| dt.format(TIME_OF_DAY_FORMAT).to_string())
            .unwrap_or_default()
    }

    pub fn checkin_sort_key(&self) -> String {
        self.checkin.as_ref().map(Stamp::sort_key).unwrap_or_default()
    }

    /// Promote a legacy `timestamp` to `checkin` and default `checkout` to empty.
    /// Only absent fields are filled; an explicit `null` stays as written.
    pub fn normalize(&mut self) {
        if self.checkin.is_none() {
            if let Some(Value::String(ts)) = self.extra.get("timestamp") {
                self.checkin = Some(Stamp::Text(ts.clone()));
            }
        }
        if self.checkout.is_none() {
            self.checkout = Some(Stamp::empty());
        }
    }
}

/// All swipe events for one calendar date, handled as a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DayFile {
    pub date: NaiveDate,
    pub events: Vec<AttendanceEvent>,
}

impl DayFile {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }

    pub fn events_for<'a>(&'a self, staff: &'a StaffId) -> impl Iterator<Item = &'a AttendanceEvent> + 'a {
        self.events.iter().filter(move |e| &e.staff_key() == staff)
    }

    pub fn positions_for(&self, staff: &StaffId) -> Vec<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.staff_key() == staff)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_staff(&self, staff: &StaffId) -> bool {
        self.events.iter().any(|e| &e.staff_key() == staff)
    }

    /// Staff ids in first-seen order.
    pub fn staff_ids(&self) -> Vec<StaffId> {
        let mut seen = Vec::new();
        for event in &self.events {
            let key = event.staff_key();
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_timestamp_becomes_checkin() {
        let mut event: AttendanceEvent = serde_json::from_value(json!({
            "student_id": "bbh1",
            "name": "Asha",
            "timestamp": "2025-01-07T09:00:00"
        }))
        .unwrap();

        event.normalize();

        assert_eq!(event.checkin, Some(Stamp::Text("2025-01-07T09:00:00".into())));
        assert_eq!(event.checkout, Some(Stamp::empty()));
        assert!(event.extra.contains_key("timestamp"));
    }

    #[test]
    fn explicit_checkin_wins_over_timestamp() {
        let mut event: AttendanceEvent = serde_json::from_value(json!({
            "student_id": "bbh1",
            "checkin": "2025-01-07T08:00:00",
            "timestamp": "2025-01-07T09:00:00"
        }))
        .unwrap();

        event.normalize();

        assert_eq!(event.checkin_time_text(), "08:00:00");
    }

    #[test]
    fn unknown_delay_text_is_dropped_not_fatal() {
        let event: AttendanceEvent = serde_json::from_value(json!({
            "student_id": "x",
            "delay": "late-ish"
        }))
        .unwrap();
        assert_eq!(event.delay, None);
    }

    #[test]
    fn delay_serialises_as_text() {
        assert_eq!(
            serde_json::to_value(DelayResult::Duration(900)).unwrap(),
            json!("00:15:00")
        );
        assert_eq!(serde_json::to_value(DelayResult::NotAvailable).unwrap(), json!("N/A"));
        assert_eq!(DelayResult::parse("Absent"), Some(DelayResult::Absent));
    }

    #[test]
    fn numeric_stamps_are_accepted() {
        let event: AttendanceEvent = serde_json::from_value(json!({
            "student_id": "x",
            "checkin": 1736240000
        }))
        .unwrap();
        assert!(event.checkin_at().is_some());
    }

    #[test]
    fn null_and_numeric_ids_do_not_fail_the_row() {
        let event: AttendanceEvent = serde_json::from_value(json!({
            "student_id": null,
            "name": null,
            "checkin": "2025-01-07T09:00:00"
        }))
        .unwrap();
        assert_eq!(event.staff_id, "");
        assert_eq!(event.name, None);

        let event: AttendanceEvent = serde_json::from_value(json!({"student_id": 1042})).unwrap();
        assert_eq!(event.staff_id, "1042");
    }

    #[test]
    fn explicit_null_stamps_are_written_back_as_null() {
        let mut event: AttendanceEvent = serde_json::from_value(json!({
            "student_id": "x",
            "checkin": null,
            "checkout": null,
            "timestamp": "2025-01-07T09:00:00"
        }))
        .unwrap();

        event.normalize();

        assert_eq!(event.checkin, Some(Stamp::Other(Value::Null)));
        assert_eq!(event.checkin_at(), None);
        assert_eq!(event.checkout_time_text(), "");
        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["checkin"], Value::Null);
        assert_eq!(back["checkout"], Value::Null);
        assert!(back.as_object().unwrap().contains_key("checkin"));
        assert!(back.as_object().unwrap().contains_key("checkout"));
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({"student_id": "x", "device": "gate-2"});
        let event: AttendanceEvent = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["device"], json!("gate-2"));
    }
}
