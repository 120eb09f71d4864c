//! Route handlers for the analytics endpoints.

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use time::{Date, Duration};

use crate::{
    AppState, Error,
    analytics::queries::{
        CategoryTotal, DailyTotal, MonthlyTotal, get_category_totals, get_daily_expense_totals,
        get_monthly_expense_total, get_monthly_totals,
    },
    db::{SharedConnection, lock},
    month::YearMonth,
    timezone::local_today,
    user::UserId,
    validation::{FieldError, ValidationErrors, coerce_date_str, query_params},
};

/// The state needed for the analytics endpoints.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    pub db_connection: SharedConnection,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query string of the monthly total endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

/// The query string of the endpoints that aggregate over a date range.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Resolve the inclusive date range, using `default_start` and `today` for
    /// the ends that are not given.
    fn resolve(
        self,
        default_start: impl FnOnce(Date) -> Date,
        today: Date,
    ) -> Result<(Date, Date), ValidationErrors> {
        let mut errors = Vec::new();
        let mut parse = |field: &str, text: Option<String>| match text {
            None => None,
            Some(text) => {
                let date = coerce_date_str(&text);
                if date.is_none() {
                    errors.push(FieldError::new(field, "Invalid date"));
                }
                date
            }
        };

        let start = parse("startDate", self.start_date);
        let end = parse("endDate", self.end_date);

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok((
            start.unwrap_or_else(|| default_start(today)),
            end.unwrap_or(today),
        ))
    }
}

/// Get the total the caller spent in the month given by the `month` query parameter.
pub async fn get_monthly_total_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Result<Json<MonthlyTotal>, Error> {
    let query = query_params(query)?;
    let month = match query.month {
        None => return Err(Error::invalid_field("month", "Required")),
        Some(month) => month
            .parse::<YearMonth>()
            .map_err(|message| Error::invalid_field("month", message))?,
    };

    let connection = lock(&state.db_connection)?;
    let total = get_monthly_expense_total(&user_id, month, &connection)?;

    Ok(Json(MonthlyTotal { month, total }))
}

/// Get the caller's totals per category.
///
/// Defaults to the range from the first day of the current month until today.
pub async fn get_category_totals_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<CategoryTotal>>, Error> {
    let query = query_params(query)?;
    let today = local_today(&state.local_timezone)?;
    let (start, end) = query.resolve(|today| YearMonth::of(today).first_day(), today)?;

    let connection = lock(&state.db_connection)?;

    get_category_totals(&user_id, start, end, &connection).map(Json)
}

/// Get the caller's totals per day.
///
/// Defaults to the range from a week ago until today.
pub async fn get_daily_totals_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyTotal>>, Error> {
    let query = query_params(query)?;
    let today = local_today(&state.local_timezone)?;
    let (start, end) = query.resolve(|today| today - Duration::days(7), today)?;

    let connection = lock(&state.db_connection)?;

    get_daily_expense_totals(&user_id, start, end, &connection).map(Json)
}

/// Get the caller's totals per month.
///
/// Defaults to the twelve months up to and including the current one.
pub async fn get_monthly_totals_endpoint(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<MonthlyTotal>>, Error> {
    let query = query_params(query)?;
    let today = local_today(&state.local_timezone)?;
    let (start, end) = query.resolve(
        |today| {
            (0..11)
                .fold(YearMonth::of(today), |month, _| month.previous())
                .first_day()
        },
        today,
    )?;

    let connection = lock(&state.db_connection)?;

    get_monthly_totals(&user_id, start, end, &connection).map(Json)
}

#[cfg(test)]
mod date_range_tests {
    use time::{Duration, macros::date};

    use super::DateRangeQuery;

    #[test]
    fn uses_defaults_for_missing_ends() {
        let today = date!(2024 - 03 - 15);

        let range = DateRangeQuery::default()
            .resolve(|today| today - Duration::days(7), today)
            .unwrap();

        assert_eq!(range, (date!(2024 - 03 - 08), today));
    }

    #[test]
    fn explicit_ends_override_defaults() {
        let range = DateRangeQuery {
            start_date: Some("2024-01-01".to_owned()),
            end_date: Some("2024-01-31T10:00:00Z".to_owned()),
        }
        .resolve(|today| today, date!(2024 - 03 - 15))
        .unwrap();

        assert_eq!(range, (date!(2024 - 01 - 01), date!(2024 - 01 - 31)));
    }

    #[test]
    fn rejects_invalid_dates() {
        let errors = DateRangeQuery {
            start_date: Some("last week".to_owned()),
            end_date: Some("2024-02-30".to_owned()),
        }
        .resolve(|today| today, date!(2024 - 03 - 15))
        .unwrap_err();

        assert!(errors.has_field("startDate"));
        assert!(errors.has_field("endDate"));
    }
}
