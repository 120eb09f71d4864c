//! Log-out route handler that ends the session and clears the session cookie.

use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState, Error,
    auth::{cookie::invalidate_session_cookie, middleware::get_session_id, session::delete_session},
    db::{SharedConnection, lock},
};

/// The state needed for logging out.
#[derive(Debug, Clone)]
pub struct LogOutState {
    pub cookie_key: Key,
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Delete the caller's session, if any, and invalidate the session cookie.
///
/// Logging out without a session is not an error.
pub async fn get_log_out(
    State(state): State<LogOutState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, StatusCode), Error> {
    if let Some(session_id) = get_session_id(&headers, &jar) {
        let connection = lock(&state.db_connection)?;
        delete_session(&session_id, &connection)?;
    }

    Ok((invalidate_session_cookie(jar), StatusCode::NO_CONTENT))
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::StatusCode;
    use time::OffsetDateTime;

    use crate::{
        auth::{COOKIE_SESSION, get_session},
        db::lock,
        endpoints,
        test_utils::TestApp,
    };

    #[tokio::test]
    async fn log_out_deletes_session_and_cookie() {
        let app = TestApp::new();

        let response = app.get(endpoints::LOG_OUT).await;

        response.assert_status(StatusCode::NO_CONTENT);
        let cookie = response.cookie(COOKIE_SESSION);
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        let connection = lock(&app.state.db_connection).unwrap();
        assert!(get_session(&app.session_id, &connection).is_err());
        drop(connection);

        app.get(endpoints::CURRENT_USER)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_out_without_session_succeeds() {
        let app = TestApp::new();

        app.server
            .get(endpoints::LOG_OUT)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
