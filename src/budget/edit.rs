//! Budget update endpoint.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    AppState, Error,
    budget::{Budget, BudgetId, BudgetPatch, db::update_budget_for_owner},
    db::{SharedConnection, lock},
    user::UserId,
    validation::json_body,
};

/// The state needed for updating a budget.
#[derive(Debug, Clone)]
pub struct UpdateBudgetState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for UpdateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Apply a partial update to one of the caller's budgets.
pub async fn update_budget_endpoint(
    State(state): State<UpdateBudgetState>,
    Extension(user_id): Extension<UserId>,
    Path(budget_id): Path<BudgetId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Budget>, Error> {
    let patch = BudgetPatch::from_json(&json_body(body)?)?;

    let connection = lock(&state.db_connection)?;

    update_budget_for_owner(&budget_id, &user_id, patch, &connection).map(Json)
}
