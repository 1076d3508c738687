use time::format_description::well_known;
use time::{Duration, OffsetDateTime};

/// Formats 'utc_date' into a string like "2024-09-01T05:10:44Z".
/// This is the format that GPX files contain.
pub fn format_utc_date(utc_date: &OffsetDateTime) -> String {
    utc_date
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| utc_date.to_string())
}

/// Formats a number of seconds as "1h 02m 03s", dropping leading zero
/// units.
pub fn format_seconds(seconds: f64) -> String {
    let d = Duration::seconds_f64(seconds.max(0.0));
    let hours = d.whole_hours();
    let minutes = d.whole_minutes() % 60;
    let secs = d.whole_seconds() % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_format_utc_date() {
        let d = datetime!(2024-09-01 05:10:44 UTC);
        assert_eq!(format_utc_date(&d), "2024-09-01T05:10:44Z");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0s");
        assert_eq!(format_seconds(59.4), "59s");
        assert_eq!(format_seconds(600.0), "10m 00s");
        assert_eq!(format_seconds(3723.0), "1h 02m 03s");
    }
}
