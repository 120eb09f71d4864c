//! Expense deletion endpoint.

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    db::{SharedConnection, lock},
    expense::{ExpenseId, db::delete_expense_for_owner},
    user::UserId,
};

/// The state needed for deleting an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete one of the caller's expenses.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, Error> {
    let connection = lock(&state.db_connection)?;

    delete_expense_for_owner(&expense_id, &user_id, &connection)?;
    tracing::debug!("user {user_id} deleted expense {expense_id}");

    Ok(StatusCode::NO_CONTENT)
}
