//! Timestamp and duration formatting utilities.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use std::time::Duration;

/// Layout of the whole-second part of the timestamp that starts every log
/// line: ISO-8601 local date-time without an offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a local time for a log line.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    format_naive(&at.naive_local())
}

/// Format a zone-less date-time for a log line.
///
/// Fractional seconds follow the whole seconds with trailing zeros
/// dropped (`.12`, not `.120`), and are left out entirely when zero.
pub fn format_naive(at: &NaiveDateTime) -> String {
    let mut out = at.format(TIMESTAMP_FORMAT).to_string();
    let nanos = at.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let fraction = format!("{:09}", nanos);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out
}

/// Format a duration in human-readable form.
pub fn pretty_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs == 0 {
        let micros = duration.as_micros();
        if micros < 1_000 {
            format!("{}µs", micros)
        } else {
            format!("{}ms", duration.as_millis())
        }
    } else if secs < 60 {
        format!("{}.{:03}s", secs, duration.subsec_millis())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_naive_whole_seconds() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 2)
            .unwrap();
        assert_eq!(format_naive(&at), "2024-03-09T07:05:02");
    }

    #[test]
    fn test_format_naive_fractional_seconds() {
        let at = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 250)
            .unwrap();
        assert_eq!(format_naive(&at), "2024-12-31T23:59:59.25");

        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_micro_opt(1, 2, 3, 120_000)
            .unwrap();
        assert_eq!(format_naive(&at), "2024-01-01T01:02:03.12");

        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_nano_opt(1, 2, 3, 100_000_007)
            .unwrap();
        assert_eq!(format_naive(&at), "2024-01-01T01:02:03.100000007");
    }

    #[test]
    fn test_format_timestamp_shape() {
        let ts = format_timestamp(&Local::now());
        let re = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?$").unwrap();
        assert!(re.is_match(&ts), "unexpected timestamp {}", ts);
    }

    #[test]
    fn test_pretty_duration() {
        assert_eq!(pretty_duration(Duration::from_micros(12)), "12µs");
        assert_eq!(pretty_duration(Duration::from_millis(340)), "340ms");
        assert_eq!(pretty_duration(Duration::from_millis(2_050)), "2.050s");
        assert_eq!(pretty_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(pretty_duration(Duration::from_secs(7_380)), "2h 3m");
    }
}
