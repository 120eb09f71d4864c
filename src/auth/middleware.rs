//! Authentication middleware that resolves the caller from their session.

use axum::{
    extract::{FromRef, Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{
        SessionId,
        cookie::get_session_id_from_cookie,
        session::{delete_session, get_session},
    },
    db::{SharedConnection, lock},
    user::{UserId, user_exists},
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// The session ID sent with a request.
///
/// An `Authorization: Bearer <sid>` header takes precedence over the session cookie.
pub(crate) fn get_session_id(headers: &HeaderMap, jar: &PrivateCookieJar) -> Option<SessionId> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(SessionId::new);

    bearer.or_else(|| get_session_id_from_cookie(jar))
}

/// Find the user that owns the live session `session_id`.
///
/// Expired sessions are deleted.
fn authenticate(session_id: &SessionId, db_connection: &SharedConnection) -> Result<UserId, Error> {
    let connection = lock(db_connection)?;

    let session = match get_session(session_id, &connection) {
        Ok(session) => session,
        Err(Error::NotFound) => return Err(Error::Unauthorized),
        Err(error) => return Err(error),
    };

    if session.is_expired(OffsetDateTime::now_utc()) {
        tracing::debug!("rejected expired session");
        delete_session(session_id, &connection)?;
        return Err(Error::Unauthorized);
    }

    let user_id = session.claims.sub;
    if !user_exists(&user_id, &connection)? {
        tracing::warn!("rejected session for deleted user {user_id}");
        return Err(Error::Unauthorized);
    }

    Ok(user_id)
}

/// Middleware function that checks for a valid session.
/// The user ID is placed into the request and then the request is executed normally if the session is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key` for decrypting and verifying the cookie contents.
pub async fn auth_guard(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = get_session_id(request.headers(), &jar) else {
        return Error::Unauthorized.into_response();
    };

    match authenticate(&session_id, &state.db_connection) {
        Ok(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}
