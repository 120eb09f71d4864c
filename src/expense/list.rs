//! Endpoints for reading the caller's expenses.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    category::Category,
    db::{SharedConnection, lock},
    expense::{
        Expense, ExpenseId,
        db::{
            get_expense_for_owner, get_expenses_by_category, get_expenses_by_date_range,
            get_expenses_by_owner,
        },
    },
    user::UserId,
    validation::{FieldError, ValidationErrors, coerce_date_str, query_params},
};

/// The state needed for reading expenses.
#[derive(Debug, Clone)]
pub struct ExpensesState {
    pub db_connection: SharedConnection,
    pub default_page_size: u32,
}

impl FromRef<AppState> for ExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            default_page_size: state.pagination_config.default_page_size,
        }
    }
}

/// The raw query string of the expense list endpoint.
///
/// Values are kept as strings so that bad values are reported as field errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    pub limit: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A validated expense filter.
#[derive(Debug, PartialEq)]
struct ExpenseFilter {
    limit: Option<u32>,
    category: Option<Category>,
    date_range: Option<(Date, Date)>,
}

impl ExpenseFilter {
    fn parse(query: ExpenseListQuery) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let limit = query.limit.and_then(|limit| match limit.trim().parse::<u32>() {
            Ok(0) | Err(_) => {
                errors.push(FieldError::new("limit", "Expected a positive integer"));
                None
            }
            Ok(limit) => Some(limit),
        });

        let category = query
            .category
            .and_then(|category| match category.parse::<Category>() {
                Ok(category) => Some(category),
                Err(message) => {
                    errors.push(FieldError::new("category", message));
                    None
                }
            });

        let mut parse_date = |field: &str, text: Option<String>| {
            let text = text?;
            let date = coerce_date_str(&text);
            if date.is_none() {
                errors.push(FieldError::new(field, "Invalid date"));
            }
            date
        };

        let has_start = query.start_date.is_some();
        let has_end = query.end_date.is_some();
        let start_date = parse_date("startDate", query.start_date);
        let end_date = parse_date("endDate", query.end_date);

        if has_start != has_end {
            let missing = if has_start { "endDate" } else { "startDate" };
            errors.push(FieldError::new(
                missing,
                "startDate and endDate must be given together",
            ));
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(Self {
            limit,
            category,
            date_range: start_date.zip(end_date),
        })
    }
}

/// List the caller's expenses, most recent first.
///
/// Expenses can be filtered by category and by an inclusive date range. At most
/// `limit` expenses are returned, or the configured default page size.
pub async fn get_expenses_endpoint(
    State(state): State<ExpensesState>,
    Extension(user_id): Extension<UserId>,
    query: Result<Query<ExpenseListQuery>, QueryRejection>,
) -> Result<Json<Vec<Expense>>, Error> {
    let query = query_params(query)?;
    let filter = ExpenseFilter::parse(query)?;
    let limit = filter.limit.unwrap_or(state.default_page_size);

    let connection = lock(&state.db_connection)?;

    let mut expenses = match (filter.date_range, filter.category) {
        (None, None) => get_expenses_by_owner(&user_id, Some(limit), &connection)?,
        (None, Some(category)) => get_expenses_by_category(&user_id, category, &connection)?,
        (Some((start, end)), category) => {
            let mut expenses = get_expenses_by_date_range(&user_id, start, end, &connection)?;
            if let Some(category) = category {
                expenses.retain(|expense| expense.category == category);
            }
            expenses
        }
    };

    expenses.truncate(limit as usize);

    Ok(Json(expenses))
}

/// Get one of the caller's expenses.
pub async fn get_expense_endpoint(
    State(state): State<ExpensesState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = lock(&state.db_connection)?;

    get_expense_for_owner(&expense_id, &user_id, &connection).map(Json)
}

#[cfg(test)]
mod expense_filter_tests {
    use time::macros::date;

    use crate::category::Category;

    use super::{ExpenseFilter, ExpenseListQuery};

    #[test]
    fn empty_query_has_no_filters() {
        let filter = ExpenseFilter::parse(ExpenseListQuery::default()).unwrap();

        assert_eq!(
            filter,
            ExpenseFilter {
                limit: None,
                category: None,
                date_range: None
            }
        );
    }

    #[test]
    fn parses_all_filters() {
        let filter = ExpenseFilter::parse(ExpenseListQuery {
            limit: Some("10".to_owned()),
            category: Some("food".to_owned()),
            start_date: Some("2024-01-01".to_owned()),
            end_date: Some("2024-01-31".to_owned()),
        })
        .unwrap();

        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.category, Some(Category::Food));
        assert_eq!(
            filter.date_range,
            Some((date!(2024 - 01 - 01), date!(2024 - 01 - 31)))
        );
    }

    #[test]
    fn rejects_bad_limit() {
        for limit in ["0", "-1", "ten", "1.5"] {
            let errors = ExpenseFilter::parse(ExpenseListQuery {
                limit: Some(limit.to_owned()),
                ..Default::default()
            })
            .unwrap_err();

            assert!(errors.has_field("limit"), "want error for limit {limit}");
        }
    }

    #[test]
    fn requires_both_ends_of_date_range() {
        let errors = ExpenseFilter::parse(ExpenseListQuery {
            start_date: Some("2024-01-01".to_owned()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(errors.has_field("endDate"));
    }
}

#[cfg(test)]
mod get_expenses_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{TestApp, assert_validation_error, id_of},
    };

    #[tokio::test]
    async fn lists_only_callers_expenses_most_recent_first() {
        let app = TestApp::new();
        let other = app.sign_in_as("other");
        app.must_create_expense("Lunch", "12.00", "food", "2024-01-05").await;
        app.must_create_expense("Bus", "3.00", "transportation", "2024-01-07").await;
        other.must_create_expense("Cinema", "15.00", "entertainment", "2024-01-06").await;

        let response = app.get(endpoints::EXPENSES).await;

        response.assert_status_ok();
        let titles: Vec<String> = response
            .json::<Vec<Value>>()
            .iter()
            .map(|expense| expense["title"].as_str().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(titles, ["Bus", "Lunch"]);
    }

    #[tokio::test]
    async fn applies_limit_and_filters() {
        let app = TestApp::new();
        app.must_create_expense("a", "1.00", "food", "2024-01-01").await;
        app.must_create_expense("b", "1.00", "food", "2024-01-15").await;
        app.must_create_expense("c", "1.00", "shopping", "2024-01-20").await;
        app.must_create_expense("d", "1.00", "food", "2024-02-01").await;

        let limited = app.get(endpoints::EXPENSES).add_query_param("limit", 1).await;
        let by_category = app
            .get(endpoints::EXPENSES)
            .add_query_param("category", "shopping")
            .await;
        let by_range = app
            .get(endpoints::EXPENSES)
            .add_query_param("startDate", "2024-01-01")
            .add_query_param("endDate", "2024-01-31")
            .add_query_param("category", "food")
            .await;

        assert_eq!(limited.json::<Vec<Value>>().len(), 1);
        assert_eq!(by_category.json::<Vec<Value>>()[0]["title"], "c");
        let titles: Vec<Value> = by_range
            .json::<Vec<Value>>()
            .into_iter()
            .map(|expense| expense["title"].clone())
            .collect();
        assert_eq!(titles, [json!("b"), json!("a")]);
    }

    #[tokio::test]
    async fn rejects_invalid_limit() {
        let app = TestApp::new();

        let response = app
            .get(endpoints::EXPENSES)
            .add_query_param("limit", "lots")
            .await;

        assert_validation_error(&response, "limit");
    }

    #[tokio::test]
    async fn rejects_repeated_query_parameter() {
        let app = TestApp::new();

        let response = app
            .get(endpoints::EXPENSES)
            .add_query_param("category", "food")
            .add_query_param("category", "other")
            .await;

        assert_validation_error(&response, "query");
    }

    #[tokio::test]
    async fn get_returns_own_expense() {
        let app = TestApp::new();
        let expense = app.must_create_expense("Coffee", "4.50", "food", "2024-01-05").await;

        let response = app
            .get(&format_endpoint(endpoints::EXPENSE, id_of(&expense)))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), expense);
    }

    #[tokio::test]
    async fn get_refuses_other_users_expense() {
        let app = TestApp::new();
        let other = app.sign_in_as("other");
        let expense = other.must_create_expense("Coffee", "4.50", "food", "2024-01-05").await;

        let response = app
            .get(&format_endpoint(endpoints::EXPENSE, id_of(&expense)))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn get_missing_expense_returns_not_found() {
        let app = TestApp::new();

        let response = app
            .get(&format_endpoint(endpoints::EXPENSE, "missing"))
            .await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>(), json!({"message": "Not found"}));
    }
}
