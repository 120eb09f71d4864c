//! Endpoint for setting the budget of a category and month.

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState, Error,
    budget::{
        Budget, NewBudget,
        db::{SetBudgetOutcome, set_budget},
    },
    db::{SharedConnection, lock},
    user::UserId,
    validation::json_body,
};

/// The state needed for setting a budget.
#[derive(Debug, Clone)]
pub struct SetBudgetState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for SetBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the caller's budget for a category and month, or replace its amount
/// if one already exists.
///
/// Responds with 201 when a budget was created and 200 when an existing one was
/// updated.
pub async fn set_budget_endpoint(
    State(state): State<SetBudgetState>,
    Extension(user_id): Extension<UserId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let new_budget = NewBudget::from_json(&json_body(body)?)?;

    let connection = lock(&state.db_connection)?;
    let (budget, outcome) = set_budget(&user_id, new_budget, &connection)?;

    let status = match outcome {
        SetBudgetOutcome::Created => StatusCode::CREATED,
        SetBudgetOutcome::Updated => StatusCode::OK,
    };

    Ok((status, Json(budget)))
}
