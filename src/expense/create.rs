//! Expense creation endpoint.

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;

use crate::{
    AppState, Error,
    db::{SharedConnection, lock},
    expense::{Expense, NewExpense, db::create_expense},
    user::UserId,
    validation::json_body,
};

/// The state needed for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create an expense owned by the authenticated user.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let new_expense = NewExpense::from_json(&json_body(body)?)?;

    let connection = lock(&state.db_connection)?;
    let expense = create_expense(&user_id, new_expense, &connection)?;

    tracing::debug!("user {user_id} created expense {}", expense.id);

    Ok((StatusCode::CREATED, Json(expense)))
}

#[cfg(test)]
mod create_expense_endpoint_tests {
    use axum::{body::Bytes, http::StatusCode};
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{TestApp, assert_validation_error},
    };

    #[tokio::test]
    async fn creates_expense_for_caller() {
        let app = TestApp::new();

        let response = app
            .post(endpoints::EXPENSES)
            .json(&json!({
                "title": "Coffee",
                "amount": "4.50",
                "category": "food",
                "date": "2024-01-05",
                "description": "Flat white"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["userId"], app.user_id.as_str());
        assert_eq!(body["title"], "Coffee");
        assert_eq!(body["amount"], "4.50");
        assert_eq!(body["category"], "food");
        assert_eq!(body["date"], "2024-01-05");
        assert_eq!(body["description"], "Flat white");
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn ignores_client_supplied_id() {
        let app = TestApp::new();

        let response = app
            .post(endpoints::EXPENSES)
            .json(&json!({
                "id": "chosen-by-client",
                "title": "Coffee",
                "amount": "4.50",
                "category": "food",
                "date": "2024-01-05"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_ne!(response.json::<Value>()["id"], "chosen-by-client");
    }

    #[tokio::test]
    async fn rejects_client_supplied_owner() {
        let app = TestApp::new();

        let response = app
            .post(endpoints::EXPENSES)
            .json(&json!({
                "userId": "someone-else",
                "title": "Coffee",
                "amount": "4.50",
                "category": "food",
                "date": "2024-01-05"
            }))
            .await;

        assert_validation_error(&response, "userId");
    }

    #[tokio::test]
    async fn rejects_invalid_fields() {
        let app = TestApp::new();

        let response = app
            .post(endpoints::EXPENSES)
            .json(&json!({
                "title": "Coffee",
                "amount": "-1.00",
                "category": "coffee",
                "date": "2024-01-05"
            }))
            .await;

        assert_validation_error(&response, "amount");
        assert_validation_error(&response, "category");
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let app = TestApp::new();

        let response = app
            .post(endpoints::EXPENSES)
            .bytes(Bytes::from_static(b"{\"title\": "))
            .content_type("application/json")
            .await;

        assert_validation_error(&response, "body");
    }
}
