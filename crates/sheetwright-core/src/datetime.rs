//! Date serial arithmetic.
//!
//! Excel stores dates as days-since-epoch with fractional-day time, under
//! one of two calendars: the 1900 system (default, which treats 1900 as a
//! leap year and therefore contains a phantom February 29, 1900 at serial
//! 60) and the 1904 system (no phantom, shifted 1462 days).

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Days between the 1900 and 1904 epochs.
pub const EPOCH_1904_OFFSET_DAYS: i64 = 1462;

/// A broken-down date/time as the format engine consumes it. `day` may be 0
/// (serial 0 reports as 1900-01-00) and February 29, 1900 exists under the
/// 1900 calendar even though no real calendar contains it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrokenDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Fractional seconds in `[0, 1)`.
    pub subsecond: f64,
    pub weekday: Weekday,
}

fn date_1899_12_30() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid constant date")
}

fn date_1899_12_31() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 31).expect("valid constant date")
}

fn date_1904_01_01() -> NaiveDate {
    NaiveDate::from_ymd_opt(1904, 1, 1).expect("valid constant date")
}

/// Convert a date/time to its serial number.
///
/// Under the 1900 system, serials that land on or after the phantom
/// February 29 are shifted up by one so serials >= 61 align with real
/// calendar dates.
pub fn to_serial(dt: NaiveDateTime, date1904: bool) -> f64 {
    let day_frac = f64::from(dt.num_seconds_from_midnight()) / 86_400.0
        + f64::from(dt.nanosecond()) / 1e9 / 86_400.0;

    if date1904 {
        let days = (dt.date() - date_1904_01_01()).num_days();
        days as f64 + day_frac
    } else {
        let mut days = (dt.date() - date_1899_12_31()).num_days();
        if days >= 60 {
            days += 1; // skip the phantom day
        }
        days as f64 + day_frac
    }
}

/// Convert a calendar date (no time component) to its serial number.
pub fn date_to_serial(date: NaiveDate, date1904: bool) -> f64 {
    to_serial(date.and_hms_opt(0, 0, 0).expect("midnight is valid"), date1904)
}

/// Convert a serial number to a broken-down date.
///
/// The 1900 system special cases: serial 0 reports as `{1900, 1, 0}` and
/// serial 60 as `{1900, 2, 29}` with day-of-week Wednesday.
pub fn from_serial(serial: f64, date1904: bool) -> BrokenDate {
    let mut day_part = serial.floor() as i64;
    let frac = serial - serial.floor();

    // Integer seconds with a 24-hour rollover cascade; sub-second precision
    // is computed separately so rounding cannot push time past midnight.
    let raw_seconds = frac * 86_400.0;
    let mut total_seconds = raw_seconds.floor() as i64;
    let mut subsecond = raw_seconds - raw_seconds.floor();
    if subsecond > 1.0 - 1e-9 {
        total_seconds += 1;
        subsecond = 0.0;
    }
    if total_seconds >= 86_400 {
        total_seconds -= 86_400;
        day_part += 1;
    }
    let hour = (total_seconds / 3600) as u32;
    let minute = ((total_seconds % 3600) / 60) as u32;
    let second = (total_seconds % 60) as u32;

    if !date1904 {
        if day_part == 0 {
            return BrokenDate {
                year: 1900,
                month: 1,
                day: 0,
                hour,
                minute,
                second,
                subsecond,
                weekday: Weekday::Sun, // December 31, 1899
            };
        }
        if day_part == 60 {
            return BrokenDate {
                year: 1900,
                month: 2,
                day: 29,
                hour,
                minute,
                second,
                subsecond,
                weekday: Weekday::Wed,
            };
        }
    }

    let date = if date1904 {
        date_1904_01_01() + Duration::days(day_part)
    } else if day_part < 60 {
        date_1899_12_31() + Duration::days(day_part)
    } else {
        date_1899_12_30() + Duration::days(day_part)
    };

    BrokenDate {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        hour,
        minute,
        second,
        subsecond,
        weekday: date.weekday(),
    }
}

/// Convert a serial number to a real calendar date/time, when one exists.
/// Returns `None` for serial 0 and the phantom serial 60 under 1900.
pub fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    let b = from_serial(serial, date1904);
    let date = NaiveDate::from_ymd_opt(b.year, b.month, b.day)?;
    let nanos = (b.subsecond * 1e9).round() as u32;
    date.and_hms_nano_opt(b.hour, b.minute, b.second, nanos.min(999_999_999))
}

/// Parse an ISO-8601 date or date-time string, as found in `t="d"` cells.
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Hijri era year for a Gregorian year.
pub fn hijri_year(gregorian_year: i32) -> i32 {
    gregorian_year - 581
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ----- 1900 system boundaries -----------------------------------------

    #[test]
    fn test_serial_0_is_jan_0_1900() {
        let b = from_serial(0.0, false);
        assert_eq!((b.year, b.month, b.day), (1900, 1, 0));
        assert_eq!(b.weekday, Weekday::Sun);
    }

    #[test]
    fn test_serial_1_is_jan_1_1900() {
        let b = from_serial(1.0, false);
        assert_eq!((b.year, b.month, b.day), (1900, 1, 1));
    }

    #[test]
    fn test_serial_59_is_feb_28_1900() {
        let b = from_serial(59.0, false);
        assert_eq!((b.year, b.month, b.day), (1900, 2, 28));
    }

    #[test]
    fn test_serial_60_is_phantom_leap_day() {
        let b = from_serial(60.0, false);
        assert_eq!((b.year, b.month, b.day), (1900, 2, 29));
        assert_eq!(b.weekday, Weekday::Wed);
    }

    #[test]
    fn test_serial_61_is_mar_1_1900() {
        let b = from_serial(61.0, false);
        assert_eq!((b.year, b.month, b.day), (1900, 3, 1));
    }

    #[test]
    fn test_unix_epoch_serial() {
        assert_eq!(date_to_serial(ymd(1970, 1, 1), false), 25_569.0);
    }

    #[test]
    fn test_to_serial_skips_phantom() {
        assert_eq!(date_to_serial(ymd(1900, 2, 28), false), 59.0);
        assert_eq!(date_to_serial(ymd(1900, 3, 1), false), 61.0);
    }

    #[test]
    fn test_serial_roundtrip_modern_dates() {
        for date in [
            ymd(1970, 1, 1),
            ymd(2000, 2, 29),
            ymd(2024, 6, 15),
            ymd(1904, 1, 1),
            ymd(1899, 12, 31),
        ] {
            let serial = date_to_serial(date, false);
            let b = from_serial(serial, false);
            if (b.year, b.month, b.day) == (1900, 1, 0) {
                // Serial 0 is the Jan-0 convention for 1899-12-31.
                assert_eq!(date, ymd(1899, 12, 31));
            } else {
                assert_eq!((b.year, b.month, b.day), (date.year(), date.month(), date.day()));
            }
        }
    }

    // ----- 1904 system ----------------------------------------------------

    #[test]
    fn test_1904_epoch_base() {
        let b = from_serial(0.0, true);
        assert_eq!((b.year, b.month, b.day), (1904, 1, 1));
    }

    #[test]
    fn test_1904_offset_is_1462_days() {
        let date = ymd(2024, 6, 15);
        let s1900 = date_to_serial(date, false);
        let s1904 = date_to_serial(date, true);
        assert_eq!(s1900 - s1904, EPOCH_1904_OFFSET_DAYS as f64);
    }

    #[test]
    fn test_1904_has_no_phantom_day() {
        let b = from_serial(59.0, true);
        assert_eq!((b.year, b.month, b.day), (1904, 2, 29)); // 1904 IS a leap year
        let b = from_serial(60.0, true);
        assert_eq!((b.year, b.month, b.day), (1904, 3, 1));
    }

    // ----- time component -------------------------------------------------

    #[test]
    fn test_fractional_day_time() {
        let b = from_serial(25_569.5, false);
        assert_eq!((b.hour, b.minute, b.second), (12, 0, 0));
        let b = from_serial(25_569.75, false);
        assert_eq!((b.hour, b.minute, b.second), (18, 0, 0));
    }

    #[test]
    fn test_time_composition() {
        // 10:30:45 = (10*3600 + 30*60 + 45) / 86400
        let frac = 37_845.0 / 86_400.0;
        let b = from_serial(100.0 + frac, false);
        assert_eq!((b.hour, b.minute, b.second), (10, 30, 45));
    }

    #[test]
    fn test_subsecond_precision_kept_separate() {
        let frac = (12.0 * 3600.0 + 0.25) / 86_400.0;
        let b = from_serial(100.0 + frac, false);
        assert_eq!((b.hour, b.minute, b.second), (12, 0, 0));
        assert!((b.subsecond - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_midnight_rollover_cascade() {
        // A fraction so close to 1.0 that seconds round to 86400.
        let b = from_serial(100.0 + (86_399.9999999 / 86_400.0), false);
        assert_eq!((b.hour, b.minute, b.second), (0, 0, 0));
        let base = from_serial(101.0, false);
        assert_eq!((b.year, b.month, b.day), (base.year, base.month, base.day));
    }

    #[test]
    fn test_to_serial_with_time() {
        let dt = ymd(1970, 1, 1).and_hms_opt(6, 0, 0).unwrap();
        assert_eq!(to_serial(dt, false), 25_569.25);
    }

    // ----- helpers --------------------------------------------------------

    #[test]
    fn test_serial_to_datetime_none_for_phantom() {
        assert!(serial_to_datetime(60.0, false).is_none());
        assert!(serial_to_datetime(0.0, false).is_none());
        assert!(serial_to_datetime(61.0, false).is_some());
    }

    #[test]
    fn test_parse_iso_datetime() {
        let dt = parse_iso_datetime("2024-06-15T10:30:00").unwrap();
        assert_eq!(dt.date(), ymd(2024, 6, 15));
        assert_eq!(dt.hour(), 10);

        let d = parse_iso_datetime("2024-06-15").unwrap();
        assert_eq!(d.date(), ymd(2024, 6, 15));
        assert_eq!(d.hour(), 0);

        assert!(parse_iso_datetime("not a date").is_none());
    }

    #[test]
    fn test_hijri_year() {
        assert_eq!(hijri_year(2024), 1443);
    }
}
