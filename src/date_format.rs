//! Date formats used at the HTTP boundary.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Calendar date format, e.g. "2024-01-05".
pub const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

// Serializes a [Date] as "YYYY-MM-DD" for use with `#[serde(with = "iso_date")]`.
time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Parse a "YYYY-MM-DD" string.
pub fn parse_iso_date(text: &str) -> Option<Date> {
    Date::parse(text, ISO_DATE_FORMAT).ok()
}

/// Format `date` as "YYYY-MM-DD".
pub fn format_iso_date(date: Date) -> String {
    // Formatting a date with a static description only fails for years
    // outside 0..=9999, which the date parsers never produce.
    date.format(ISO_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}
