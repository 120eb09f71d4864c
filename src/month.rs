//! Calendar months written as "YYYY-MM".

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Serialize, Serializer};
use serde_json::Value;
use time::{Date, Month};

use crate::validation::type_name;

/// A month of a specific year, e.g. January 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    /// Create a month token.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month containing `date`.
    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        // Day one exists in every month, the year is limited to four digits by
        // the parser.
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        let length = time::util::days_in_year_month(self.year, self.month);

        Date::from_calendar_date(self.year, self.month, length).unwrap_or(Date::MAX)
    }

    /// The month after this one.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year + 1, Month::January),
            month => Self::new(self.year, month.next()),
        }
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// Parse a month from a JSON value, which must be a "YYYY-MM" string.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(text) => text.parse(),
            other => Err(format!("Expected string, received {}", type_name(other))),
        }
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("\"{s}\" is not a month in the format YYYY-MM");

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;

        if year.len() != 4
            || month.len() != 2
            || !year.bytes().all(|byte| byte.is_ascii_digit())
            || !month.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self::new(year, month))
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl ToSql for YearMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for YearMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use super::YearMonth;

    #[test]
    fn parses_and_formats() {
        let month: YearMonth = "2024-01".parse().unwrap();

        assert_eq!(month, YearMonth::new(2024, Month::January));
        assert_eq!(month.to_string(), "2024-01");
    }

    #[test]
    fn rejects_malformed_months() {
        for text in ["2024-13", "2024-00", "2024-1", "24-01", "2024/01", "2024-01-01", ""] {
            assert!(text.parse::<YearMonth>().is_err(), "{text} should be rejected");
        }
    }

    #[test]
    fn month_range_is_inclusive_of_last_day() {
        let month = YearMonth::new(2024, Month::February);

        assert_eq!(month.first_day(), date!(2024 - 02 - 01));
        assert_eq!(month.last_day(), date!(2024 - 02 - 29));
    }

    #[test]
    fn december_rolls_over_year() {
        let month = YearMonth::new(2023, Month::December);

        assert_eq!(month.last_day(), date!(2023 - 12 - 31));
        assert_eq!(month.next(), YearMonth::new(2024, Month::January));
        assert_eq!(month.next().previous(), month);
    }

    #[test]
    fn last_day_of_latest_month() {
        let month: YearMonth = "9999-12".parse().unwrap();

        assert_eq!(month.first_day(), date!(9999 - 12 - 01));
        assert_eq!(month.last_day(), date!(9999 - 12 - 31));
    }

    #[test]
    fn serializes_as_string() {
        let month = YearMonth::new(2024, Month::March);

        assert_eq!(serde_json::to_string(&month).unwrap(), "\"2024-03\"");
    }
}
