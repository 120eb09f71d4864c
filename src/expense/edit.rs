//! Expense update endpoint.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    AppState, Error,
    db::{SharedConnection, lock},
    expense::{Expense, ExpenseId, ExpensePatch, db::update_expense_for_owner},
    user::UserId,
    validation::json_body,
};

/// The state needed for updating an expense.
#[derive(Debug, Clone)]
pub struct UpdateExpenseState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for UpdateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Apply a partial update to one of the caller's expenses.
pub async fn update_expense_endpoint(
    State(state): State<UpdateExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Expense>, Error> {
    let patch = ExpensePatch::from_json(&json_body(body)?)?;

    let connection = lock(&state.db_connection)?;

    update_expense_for_owner(&expense_id, &user_id, patch, &connection).map(Json)
}
