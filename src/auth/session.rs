//! Server-side sessions that tie a session ID to the user who signed in.
//!
//! The session payload is stored as a JSON blob so that the identity provider
//! can add claims without changing the table.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    user::{UserId, user_exists},
};

/// How long a session is valid for unless the caller asks for something else.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::weeks(1);

/// An opaque, unguessable session identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new, random session ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The session ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for SessionId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for SessionId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(SessionId::new)
    }
}

/// The claims stored in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The user the session belongs to.
    pub sub: UserId,
}

/// A signed in user's session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The session ID sent by the client.
    pub sid: SessionId,
    /// Who the session belongs to.
    pub claims: SessionClaims,
    /// The time after which the session is no longer valid.
    pub expire: OffsetDateTime,
}

impl Session {
    /// Whether the session has expired at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expire <= now
    }
}

/// Create the session table and its expiry index.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS session (
            sid TEXT PRIMARY KEY,
            sess TEXT NOT NULL,
            expire TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_session_expire ON session(expire);",
    )?;

    Ok(())
}

/// Start a session for `user_id` that is valid for `duration`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn create_session(
    user_id: &UserId,
    duration: Duration,
    connection: &Connection,
) -> Result<Session, Error> {
    if !user_exists(user_id, connection)? {
        return Err(Error::NotFound);
    }

    let claims = SessionClaims {
        sub: user_id.clone(),
    };
    let sess = serde_json::to_string(&claims)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    connection
        .prepare(
            "INSERT INTO session (sid, sess, expire) VALUES (?1, ?2, ?3)
            RETURNING sid, sess, expire",
        )?
        .query_row(
            (SessionId::generate(), sess, OffsetDateTime::now_utc() + duration),
            map_row,
        )
        .map_err(Error::from)
}

/// Get the session with the ID `sid`, whether or not it has expired.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such session.
pub fn get_session(sid: &SessionId, connection: &Connection) -> Result<Session, Error> {
    connection
        .prepare("SELECT sid, sess, expire FROM session WHERE sid = :sid")?
        .query_row(&[(":sid", sid)], map_row)
        .map_err(Error::from)
}

/// Delete the session with the ID `sid`. Deleting a session that does not
/// exist is not an error.
pub fn delete_session(sid: &SessionId, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM session WHERE sid = ?1", [sid])?;

    Ok(())
}

/// Delete every session that has expired at `now`, returning how many were deleted.
pub fn delete_expired_sessions(
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    let deleted = connection.execute("DELETE FROM session WHERE expire <= ?1", [now])?;

    if deleted > 0 {
        tracing::debug!("deleted {deleted} expired session(s)");
    }

    Ok(deleted)
}

fn map_row(row: &Row) -> Result<Session, rusqlite::Error> {
    let sess: String = row.get(1)?;
    let claims = serde_json::from_str(&sess).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Session {
        sid: row.get(0)?,
        claims,
        expire: row.get(2)?,
    })
}
