//! Endpoints for reading the caller's budgets.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};

use crate::{
    AppState, Error,
    budget::{
        Budget, BudgetId,
        db::{get_budget_for_owner, get_budgets_by_owner},
    },
    db::{SharedConnection, lock},
    user::UserId,
};

/// The state needed for reading budgets.
#[derive(Debug, Clone)]
pub struct BudgetsState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for BudgetsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the caller's budgets, latest month first.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetsState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = lock(&state.db_connection)?;

    get_budgets_by_owner(&user_id, &connection).map(Json)
}

/// Get one of the caller's budgets.
pub async fn get_budget_endpoint(
    State(state): State<BudgetsState>,
    Extension(user_id): Extension<UserId>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Budget>, Error> {
    let connection = lock(&state.db_connection)?;

    get_budget_for_owner(&budget_id, &user_id, &connection).map(Json)
}

#[cfg(test)]
mod get_budgets_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::Value;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{TestApp, id_of},
    };

    #[tokio::test]
    async fn lists_only_callers_budgets() {
        let app = TestApp::new();
        let other = app.sign_in_as("other");
        app.must_set_budget("food", "300.00", "2024-01").await;
        other.must_set_budget("shopping", "50.00", "2024-01").await;

        let budgets: Vec<Value> = app.get(endpoints::BUDGETS).await.json();

        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0]["category"], "food");
    }

    #[tokio::test]
    async fn get_refuses_other_users_budget() {
        let app = TestApp::new();
        let other = app.sign_in_as("other");
        let budget = other.must_set_budget("food", "300.00", "2024-01").await;

        app.get(&format_endpoint(endpoints::BUDGET, id_of(&budget)))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        other
            .get(&format_endpoint(endpoints::BUDGET, id_of(&budget)))
            .await
            .assert_status_ok();
    }
}
