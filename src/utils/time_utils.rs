use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Formats accepted for textual timestamps in day files, tried in order.
const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Epoch values above this are milliseconds, below it seconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a textual timestamp. Empty or unrecognised text yields `None`.
pub fn parse_timestamp_str(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Interpret a numeric epoch (seconds or milliseconds) as local wall-clock time.
pub fn parse_epoch(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let seconds = if value > EPOCH_MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;

    Local
        .timestamp_opt(whole, nanos.min(999_999_999))
        .single()
        .map(|dt| dt.naive_local())
}

/// Render whole seconds as zero-padded `HH:MM:SS`; negatives clamp to zero.
pub fn format_hhmmss(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Inverse of [`format_hhmmss`]. Hours may exceed 23.
pub fn parse_hhmmss(value: &str) -> Option<i64> {
    let mut parts = value.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds)
    {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)
}

/// Strict time-of-day parse for caller-supplied `HH:MM:SS` values.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FORMAT).ok()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// Signed difference in milliseconds between two wall-clock instants.
pub fn millis_between(later: NaiveDateTime, earlier: NaiveDateTime) -> i64 {
    (later - earlier).num_milliseconds()
}

/// Round-half-up of non-negative milliseconds to whole seconds.
pub fn round_millis(ms: i64) -> i64 {
    (ms.max(0) + 500) / 1000
}

/// Ceiling of non-negative milliseconds to whole seconds.
pub fn ceil_millis(ms: i64) -> i64 {
    (ms.max(0) + 999) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_timestamp_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 7)
            .unwrap()
            .and_hms_opt(9, 10, 0)
            .unwrap();

        for raw in [
            "2025-01-07T09:10:00",
            "2025-01-07 09:10:00",
            "2025-01-07T09:10:00Z",
            "2025-01-07T09:10:00.000Z",
            "2025-01-07T09:10:00.000",
        ] {
            assert_eq!(parse_timestamp_str(raw), Some(expected), "format {raw}");
        }
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_timestamp_str(""), None);
        assert_eq!(parse_timestamp_str("   "), None);
        assert_eq!(parse_timestamp_str("yesterday"), None);
        assert_eq!(parse_epoch(0.0), None);
        assert_eq!(parse_epoch(f64::NAN), None);
    }

    #[test]
    fn epoch_seconds_and_millis_agree() {
        let secs = parse_epoch(1_736_240_000.0).unwrap();
        let millis = parse_epoch(1_736_240_000_000.0).unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn formats_durations_zero_padded_and_clamped() {
        assert_eq!(format_hhmmss(0), "00:00:00");
        assert_eq!(format_hhmmss(900), "00:15:00");
        assert_eq!(format_hhmmss(3661), "01:01:01");
        assert_eq!(format_hhmmss(-42), "00:00:00");
        assert_eq!(format_hhmmss(100 * 3600), "100:00:00");
    }

    #[test]
    fn parses_durations_back() {
        assert_eq!(parse_hhmmss("01:01:01"), Some(3661));
        assert_eq!(parse_hhmmss("00:60:00"), None);
        assert_eq!(parse_hhmmss("N/A"), None);
        assert_eq!(parse_hhmmss("1:2"), None);
        assert_eq!(parse_hhmmss("9999999999999999:00:00"), None);
        assert_eq!(parse_hhmmss("2562047788015215:30:07"), Some(i64::MAX));
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_millis(1499), 1);
        assert_eq!(round_millis(1500), 2);
        assert_eq!(round_millis(-10), 0);
        assert_eq!(ceil_millis(1001), 2);
        assert_eq!(ceil_millis(1000), 1);
    }

    #[test]
    fn time_of_day_validation() {
        assert!(parse_time_of_day("09:40:00").is_some());
        assert!(parse_time_of_day("25:00:00").is_none());
        assert!(parse_time_of_day("9.40").is_none());
    }
}
