use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Canonical cell/display format (the `datetime-local` form)
pub const DUE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Stored form for dates that carry seconds or a fraction of one
const DUE_FORMAT_PRECISE: &str = "%Y-%m-%dT%H:%M:%S%.f";

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date: '{0}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM)")]
pub struct ParseDueError(pub String);

/// Parse a due date. A bare date means midnight.
pub fn parse_due(s: &str) -> Result<NaiveDateTime, ParseDueError> {
    let s = s.trim();
    for fmt in ACCEPTED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    // RFC 3339 with offset: keep the wall-clock time as written
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| ParseDueError(s.to_string()))
}

/// Parse an optional due date; empty input means "no date"
pub fn parse_optional_due(s: &str) -> Result<Option<NaiveDateTime>, ParseDueError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_due(s).map(Some)
    }
}

/// Minute form when that is exact, otherwise seconds are kept so a stored
/// date reads back unchanged.
pub fn format_due(dt: &NaiveDateTime) -> String {
    if dt.second() == 0 && dt.nanosecond() == 0 {
        dt.format(DUE_FORMAT).to_string()
    } else {
        dt.format(DUE_FORMAT_PRECISE).to_string()
    }
}

/// Human display: `2025-06-01 09:00`, or a placeholder when unset
pub fn display_due(dt: Option<&NaiveDateTime>) -> String {
    match dt {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Current local wall-clock time
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Midnight at the start of `now`'s day; the floor for the not-in-the-past check
pub fn start_of_day(now: &NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(NaiveTime::MIN)
}

/// Whole days from `now` until `due`, truncated toward zero.
/// Negative when `due` has passed.
pub fn days_until(due: &NaiveDateTime, now: &NaiveDateTime) -> i64 {
    (*due - *now).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn parse_accepts_common_forms() {
        assert_eq!(parse_due("2025-06-01T09:30").unwrap(), dt(2025, 6, 1, 9, 30));
        assert_eq!(parse_due("2025-06-01 09:30").unwrap(), dt(2025, 6, 1, 9, 30));
        assert_eq!(parse_due("2025-06-01T09:30:00").unwrap(), dt(2025, 6, 1, 9, 30));
        assert_eq!(parse_due("2025-06-01").unwrap(), dt(2025, 6, 1, 0, 0));
        assert_eq!(
            parse_due("2025-06-01T09:30:00+09:00").unwrap(),
            dt(2025, 6, 1, 9, 30)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_due("tomorrow").is_err());
        assert!(parse_due("2025-13-01").is_err());
    }

    #[test]
    fn optional_empty_is_none() {
        assert_eq!(parse_optional_due("  ").unwrap(), None);
        assert!(parse_optional_due("2025-06-01").unwrap().is_some());
    }

    #[test]
    fn format_is_datetime_local() {
        assert_eq!(format_due(&dt(2025, 6, 1, 9, 5)), "2025-06-01T09:05");
        assert_eq!(display_due(Some(&dt(2025, 6, 1, 9, 5))), "2025-06-01 09:05");
        assert_eq!(display_due(None), "-");
    }

    #[test]
    fn format_keeps_seconds_when_present() {
        let with_secs = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 45)
            .unwrap();
        assert_eq!(format_due(&with_secs), "2030-01-01T09:30:45");
        assert_eq!(parse_due(&format_due(&with_secs)).unwrap(), with_secs);

        let with_millis = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_milli_opt(9, 30, 45, 250)
            .unwrap();
        assert_eq!(format_due(&with_millis), "2030-01-01T09:30:45.250");
        assert_eq!(parse_due(&format_due(&with_millis)).unwrap(), with_millis);
    }

    #[test]
    fn start_of_day_is_midnight() {
        assert_eq!(start_of_day(&dt(2025, 6, 1, 17, 45)), dt(2025, 6, 1, 0, 0));
    }

    #[test]
    fn days_until_truncates_toward_zero() {
        let now = dt(2025, 6, 1, 12, 0);
        assert_eq!(days_until(&dt(2025, 6, 8, 12, 0), &now), 7);
        assert_eq!(days_until(&dt(2025, 6, 9, 11, 0), &now), 7);
        assert_eq!(days_until(&dt(2025, 6, 1, 0, 0), &now), 0);
        assert_eq!(days_until(&dt(2025, 5, 30, 0, 0), &now), -2);
    }
}
