//! Aggregations of a user's expenses.
//!
//! Sums are computed by SQLite over integer cents so they are exact, and are
//! only converted to decimal amounts when read back.

use rusqlite::{Connection, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error, category::Category, date_format::iso_date, money::Amount, month::YearMonth,
    user::UserId,
};

/// The total spent in a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// The month the total covers.
    pub month: YearMonth,
    /// The sum of the expenses in the month.
    pub total: Amount,
}

/// The total spent, and the number of expenses, in a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category the total covers.
    pub category: Category,
    /// The sum of the expenses in the category.
    pub total: Amount,
    /// The number of expenses in the category.
    pub count: u32,
}

/// The total spent on a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    /// The day the total covers.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The sum of the expenses on the day.
    pub total: Amount,
}

/// The total `owner` spent in `month`, zero if there are no expenses.
pub fn get_monthly_expense_total(
    owner: &UserId,
    month: YearMonth,
    connection: &Connection,
) -> Result<Amount, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expense
        WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        params![owner, month.first_day(), month.last_day()],
        |row| row.get(0),
    )?;

    Ok(Amount::from_cents(cents))
}

/// The totals per category of the expenses `owner` made between `start` and
/// `end` inclusive, ordered by category name.
///
/// Categories without expenses are left out.
pub fn get_category_totals(
    owner: &UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category, SUM(amount), COUNT(*) FROM expense
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            GROUP BY category
            ORDER BY category ASC",
        )?
        .query_map(params![owner, start, end], |row| {
            let cents: i64 = row.get(1)?;

            Ok(CategoryTotal {
                category: row.get(0)?,
                total: Amount::from_cents(cents),
                count: row.get(2)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// The totals per day of the expenses `owner` made between `start` and `end`
/// inclusive, oldest first.
///
/// Days without expenses are left out.
pub fn get_daily_expense_totals(
    owner: &UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<DailyTotal>, Error> {
    connection
        .prepare(
            "SELECT date, SUM(amount) FROM expense
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            GROUP BY date
            ORDER BY date ASC",
        )?
        .query_map(params![owner, start, end], |row| {
            let cents: i64 = row.get(1)?;

            Ok(DailyTotal {
                date: row.get(0)?,
                total: Amount::from_cents(cents),
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// The totals per month of the expenses `owner` made between `start` and `end`
/// inclusive, oldest first.
///
/// Months without expenses are left out.
pub fn get_monthly_totals(
    owner: &UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<MonthlyTotal>, Error> {
    connection
        .prepare(
            "SELECT substr(date, 1, 7) AS month, SUM(amount) FROM expense
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            GROUP BY month
            ORDER BY month ASC",
        )?
        .query_map(params![owner, start, end], |row| {
            let cents: i64 = row.get(1)?;

            Ok(MonthlyTotal {
                month: row.get(0)?,
                total: Amount::from_cents(cents),
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}
