//! Issue-date normalization shared by the extractors and the batch layer.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// Fixed display format of the output table (`YYYY-MM-DD HH:MM:SS`).
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted input shapes: CFDI ISO-8601 (with and without fractional
/// seconds), the display format itself (so normalization is idempotent),
/// and a bare date.
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    DISPLAY_FORMAT,
];

/// Spanish month names, indexed by zero-based month.
pub const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Parse a raw issue-date string; `None` when no accepted shape matches.
pub fn parse_issue_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in INPUT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Render a timestamp in the fixed display format.
pub fn format_display(dt: NaiveDateTime) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

/// Spanish month name for a raw issue date; empty when unparseable.
pub fn month_name(raw: &str) -> &'static str {
    parse_issue_date(raw)
        .map(|dt| MONTHS_ES[dt.month0() as usize])
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cfdi_iso_dates() {
        let dt = parse_issue_date("2024-05-10T09:30:15").unwrap();
        assert_eq!(format_display(dt), "2024-05-10 09:30:15");

        let dt = parse_issue_date("2024-05-10T09:30:15.123").unwrap();
        assert_eq!(format_display(dt), "2024-05-10 09:30:15");

        let dt = parse_issue_date("2024-05-10").unwrap();
        assert_eq!(format_display(dt), "2024-05-10 00:00:00");
    }

    #[test]
    fn display_format_reparses_to_same_instant() {
        let dt = parse_issue_date("2023-12-31T23:59:59").unwrap();
        assert_eq!(parse_issue_date(&format_display(dt)), Some(dt));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_issue_date(""), None);
        assert_eq!(parse_issue_date("10/05/2024"), None);
        assert_eq!(parse_issue_date("pronto"), None);
    }

    #[test]
    fn month_names_are_spanish() {
        assert_eq!(month_name("2024-01-05T00:00:00"), "enero");
        assert_eq!(month_name("2024-12-05T00:00:00"), "diciembre");
        assert_eq!(month_name("no date"), "");
    }
}
