use chrono::{DateTime, DurationRound, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use crate::error::BookingError;

// Zone-less formats are read as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a request time into UTC.
///
/// RFC 3339 with any offset (including `Z` and fractional seconds) is tried
/// first, then the zone-less forms above.
pub fn parse_request_time(raw: &str) -> Result<DateTime<Utc>, BookingError> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| BookingError::InvalidTime(raw.to_string()))
}

/// The one-minute window a requested time resolves to: show times are
/// matched after truncating both sides to the minute.
pub fn minute_window(time: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let start = time
        .duration_trunc(TimeDelta::minutes(1))
        .map_err(|_| BookingError::InvalidTime(time.to_rfc3339()))?;
    Ok((start, shifted(start, TimeDelta::minutes(1))?))
}

/// `[00:00, 24:00)` UTC of the calendar day containing `time`.
pub fn utc_day(time: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let start = time.date_naive().and_time(NaiveTime::MIN).and_utc();
    Ok((start, shifted(start, TimeDelta::hours(24))?))
}

/// `time + delta`, or `InvalidTime` past the last representable instant.
pub fn shifted(time: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, BookingError> {
    time.checked_add_signed(delta)
        .ok_or_else(|| BookingError::InvalidTime(time.to_rfc3339()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn accepts_known_formats() {
        let expected = utc(2025, 3, 14, 18, 30, 0);
        for raw in [
            "2025-03-14T18:30:00Z",
            "2025-03-14T18:30:00.000Z",
            "2025-03-14T18:30:00+00:00",
            "2025-03-15T00:00:00+05:30",
            "2025-03-14 18:30:00",
            "2025-03-14T18:30:00",
            " 2025-03-14 18:30 ",
        ] {
            assert_eq!(parse_request_time(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "tomorrow", "2025-13-01T00:00:00Z", "14/03/2025 18:30"] {
            assert!(matches!(parse_request_time(raw), Err(BookingError::InvalidTime(_))), "{raw}");
        }
    }

    #[test]
    fn minute_window_truncates() {
        let (from, to) = minute_window(utc(2025, 3, 14, 18, 30, 59)).unwrap();
        assert_eq!(from, utc(2025, 3, 14, 18, 30, 0));
        assert_eq!(to, utc(2025, 3, 14, 18, 31, 0));
    }

    #[test]
    fn day_window_is_utc_midnight_to_midnight() {
        let (from, to) = utc_day(utc(2025, 3, 14, 23, 59, 59)).unwrap();
        assert_eq!(from, utc(2025, 3, 14, 0, 0, 0));
        assert_eq!(to, utc(2025, 3, 15, 0, 0, 0));
    }

    #[test]
    fn windows_past_the_last_instant_are_invalid() {
        let raw = DateTime::<Utc>::MAX_UTC.format("%Y-%m-%d %H:%M:%S").to_string();
        let last = parse_request_time(&raw).unwrap();

        assert!(matches!(minute_window(last), Err(BookingError::InvalidTime(_))));
        assert!(matches!(utc_day(last), Err(BookingError::InvalidTime(_))));
        assert!(shifted(last, TimeDelta::seconds(1)).is_err());
        // the day before still has a full window
        assert!(utc_day(last - TimeDelta::days(1)).is_ok());
    }
}
