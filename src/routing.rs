//! Application router configuration with protected and unprotected route definitions.

use axum::{Router, middleware, routing::get};

use crate::{
    AppState, Error,
    analytics::{
        get_category_totals_endpoint, get_daily_totals_endpoint, get_monthly_total_endpoint,
        get_monthly_totals_endpoint,
    },
    auth::{auth_guard, get_log_out},
    budget::{
        delete_budget_endpoint, get_budget_endpoint, get_budgets_endpoint, set_budget_endpoint,
        update_budget_endpoint,
    },
    category::get_categories,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
        get_expenses_endpoint, update_expense_endpoint,
    },
    user::get_current_user,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(endpoints::CATEGORIES, get(get_categories))
        .route(
            endpoints::EXPENSES,
            get(get_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(set_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(endpoints::MONTHLY_TOTAL, get(get_monthly_total_endpoint))
        .route(endpoints::CATEGORY_TOTALS, get(get_category_totals_endpoint))
        .route(endpoints::DAILY_TOTALS, get(get_daily_totals_endpoint))
        .route(endpoints::MONTHLY_TOTALS, get(get_monthly_totals_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The fallback for requests that do not match any route.
async fn get_404_not_found() -> Error {
    Error::NotFound
}
