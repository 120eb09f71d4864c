//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

use std::fmt::Display;

/// The route for the profile of the authenticated user.
pub const CURRENT_USER: &str = "/api/auth/user";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route listing the expense categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to read, update and delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to list and set budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to read, update and delete a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for the total spent in a month.
pub const MONTHLY_TOTAL: &str = "/api/analytics/monthly-total";
/// The route for the amount spent per category.
pub const CATEGORY_TOTALS: &str = "/api/analytics/category-totals";
/// The route for the amount spent per day.
pub const DAILY_TOTALS: &str = "/api/analytics/daily-totals";
/// The route for the amount spent per month.
pub const MONTHLY_TOTALS: &str = "/api/analytics/monthly-totals";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path contains a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::CURRENT_USER);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES);
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::EXPENSE, "abc"));
        assert_endpoint_is_valid_uri(endpoints::BUDGETS);
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::BUDGET, "abc"));
        assert_endpoint_is_valid_uri(endpoints::MONTHLY_TOTAL);
        assert_endpoint_is_valid_uri(endpoints::CATEGORY_TOTALS);
        assert_endpoint_is_valid_uri(endpoints::DAILY_TOTALS);
        assert_endpoint_is_valid_uri(endpoints::MONTHLY_TOTALS);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        let formatted_path = format_endpoint("/hello/{world}", "f47ac10b");

        assert_eq!(formatted_path, "/hello/f47ac10b");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
    }
}
