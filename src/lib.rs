//! Spendwise is a web service for tracking personal expenses and monthly budgets.
//!
//! This library provides a JSON REST API. Every record belongs to a user and
//! can only be read or changed by that user. Callers are identified by a
//! session that is created by the identity provider.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod analytics;
mod app_state;
mod auth;
mod budget;
mod category;
mod date_format;
mod db;
mod endpoints;
mod error;
mod expense;
mod logging;
mod money;
mod month;
mod pagination;
mod routing;
mod timezone;
mod user;
mod validation;

#[cfg(test)]
mod test_utils;

pub use analytics::{
    CategoryTotal, DailyTotal, MonthlyTotal, get_category_totals, get_daily_expense_totals,
    get_monthly_expense_total, get_monthly_totals,
};
pub use app_state::{AppState, create_cookie_key};
pub use auth::{
    DEFAULT_SESSION_DURATION, Session, SessionClaims, SessionId, create_session,
    delete_expired_sessions, delete_session, get_session, set_session_cookie,
};
pub use budget::{
    Budget, BudgetId, BudgetPatch, NewBudget, SetBudgetOutcome, create_budget, delete_budget,
    delete_budget_for_owner, get_budget_by_id, get_budget_by_owner_category_month,
    get_budget_for_owner, get_budgets_by_owner, set_budget, update_budget,
    update_budget_for_owner,
};
pub use category::Category;
pub use db::{SharedConnection, initialize as initialize_db};
pub use error::Error;
pub use expense::{
    DEFAULT_PAGE_SIZE, Expense, ExpenseId, ExpensePatch, MAX_TITLE_LENGTH, NewExpense,
    create_expense, delete_expense, delete_expense_for_owner, get_expense_by_id,
    get_expense_for_owner, get_expenses_by_category, get_expenses_by_date_range,
    get_expenses_by_owner, update_expense, update_expense_for_owner,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_SIZE, logging_middleware};
pub use money::Amount;
pub use month::YearMonth;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use user::{UpsertUser, User, UserId, delete_user, get_user, upsert_user, user_exists};
pub use validation::{FieldError, ValidationErrors};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
