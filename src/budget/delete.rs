//! Budget deletion endpoint.

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    budget::{BudgetId, db::delete_budget_for_owner},
    db::{SharedConnection, lock},
    user::UserId,
};

/// The state needed for deleting a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete one of the caller's budgets.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    Extension(user_id): Extension<UserId>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = lock(&state.db_connection)?;

    delete_budget_for_owner(&budget_id, &user_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
