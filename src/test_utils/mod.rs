#![allow(missing_docs)]

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::{TestRequest, TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::{SessionId, create_session},
    db::{initialize, lock},
    endpoints,
    pagination::PaginationConfig,
    routing::build_router,
    user::{UpsertUser, UserId, upsert_user},
};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn must_create_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

#[track_caller]
pub(crate) fn must_create_user(id: &str, connection: &Connection) -> UserId {
    upsert_user(
        UpsertUser {
            id: Some(UserId::new(id)),
            email: Some(format!("{id}@example.com")),
            ..Default::default()
        },
        connection,
    )
    .expect("Could not create test user")
    .id
}

/// The `id` field of a JSON record.
#[track_caller]
pub(crate) fn id_of(record: &Value) -> &str {
    record["id"].as_str().expect("record has no string id")
}

#[track_caller]
pub(crate) fn assert_validation_error(response: &TestResponse, field: &str) {
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid input data");

    let errors = body["errors"].as_array().expect("errors should be a list");
    assert!(
        errors.iter().any(|error| error["field"] == field),
        "want an error for {field}, got {body}"
    );
}

/// The full router backed by an in-memory database, with a signed in user.
pub(crate) struct TestApp {
    pub server: Arc<TestServer>,
    pub state: AppState,
    pub user_id: UserId,
    pub session_id: SessionId,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not create in-memory SQLite database"),
            "foobar",
            "Etc/UTC",
            PaginationConfig::default(),
        )
        .expect("Could not create app state");
        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        Self::sign_in(Arc::new(server), state, "test-user")
    }

    /// A client for another user of the same server.
    pub fn sign_in_as(&self, user_id: &str) -> Self {
        Self::sign_in(self.server.clone(), self.state.clone(), user_id)
    }

    fn sign_in(server: Arc<TestServer>, state: AppState, user_id: &str) -> Self {
        let connection = lock(&state.db_connection).expect("Could not lock database");
        let user_id = must_create_user(user_id, &connection);
        let session = create_session(&user_id, state.session_duration, &connection)
            .expect("Could not create session");
        drop(connection);

        Self {
            server,
            state,
            user_id,
            session_id: session.sid,
        }
    }

    fn authorize(&self, request: TestRequest) -> TestRequest {
        request.add_header("Authorization", format!("Bearer {}", self.session_id))
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.authorize(self.server.get(path))
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.authorize(self.server.post(path))
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.authorize(self.server.put(path))
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.authorize(self.server.delete(path))
    }

    pub async fn must_create_expense(
        &self,
        title: &str,
        amount: &str,
        category: &str,
        date: &str,
    ) -> Value {
        let response = self
            .post(endpoints::EXPENSES)
            .json(&json!({
                "title": title,
                "amount": amount,
                "category": category,
                "date": date
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json()
    }

    pub async fn must_set_budget(&self, category: &str, amount: &str, month: &str) -> Value {
        let response = self
            .post(endpoints::BUDGETS)
            .json(&json!({"category": category, "amount": amount, "month": month}))
            .await;
        assert!(
            response.status_code().is_success(),
            "could not set budget: {}",
            response.text()
        );

        response.json()
    }
}
