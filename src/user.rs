//! Code for creating the user table and reading and writing users.
//!
//! Users are created and updated by the identity provider. The rest of the
//! application only reads them to check who owns a record.

use std::fmt::Display;

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{
    Connection, OptionalExtension, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, db::SharedConnection};

/// A newtype wrapper for the opaque user IDs issued by the identity provider.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for UserId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(UserId::new)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID as issued by the identity provider.
    pub id: UserId,
    /// The user's email address, unique across users.
    pub email: Option<String>,
    /// The user's given name.
    pub first_name: Option<String>,
    /// The user's family name.
    pub last_name: Option<String>,
    /// A link to the user's avatar.
    pub profile_image_url: Option<String>,
    /// When the user first signed in.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user's profile was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The profile fields the identity provider supplies when a user signs in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUser {
    /// The provider's ID for the user, generated when missing.
    pub id: Option<UserId>,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's given name.
    pub first_name: Option<String>,
    /// The user's family name.
    pub last_name: Option<String>,
    /// A link to the user's avatar.
    pub profile_image_url: Option<String>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE,
                first_name TEXT,
                last_name TEXT,
                profile_image_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Insert a user, or update the profile of the user with the same ID.
///
/// A user ID is generated if `user.id` is `None`. The creation time of an
/// existing user is kept, the update time is always refreshed.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred, e.g. the email
/// address belongs to another user.
pub fn upsert_user(user: UpsertUser, connection: &Connection) -> Result<User, Error> {
    let id = user
        .id
        .unwrap_or_else(|| UserId::new(uuid::Uuid::new_v4().to_string()));
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO user (id, email, first_name, last_name, profile_image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                profile_image_url = excluded.profile_image_url,
                updated_at = excluded.updated_at
            RETURNING id, email, first_name, last_name, profile_image_url, created_at, updated_at",
        )?
        .query_row(
            (
                &id,
                &user.email,
                &user.first_name,
                &user.last_name,
                &user.profile_image_url,
                now,
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user(user_id: &UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, first_name, last_name, profile_image_url, created_at, updated_at
            FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", user_id)], map_row)
        .map_err(|error| error.into())
}

/// Whether a user with the ID `user_id` exists.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn user_exists(user_id: &UserId, connection: &Connection) -> Result<bool, Error> {
    let found = connection
        .query_row("SELECT 1 FROM user WHERE id = ?1", [user_id], |_| Ok(()))
        .optional()?;

    Ok(found.is_some())
}

/// Delete a user along with all of their expenses and budgets.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn delete_user(user_id: &UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM user WHERE id = ?1", [user_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        profile_image_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// The state needed to look up the current user.
#[derive(Debug, Clone)]
pub struct CurrentUserState {
    /// The database connection.
    pub db_connection: SharedConnection,
}

impl FromRef<AppState> for CurrentUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the profile of the authenticated user.
pub async fn get_current_user(
    State(state): State<CurrentUserState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<User>, Error> {
    let connection = crate::db::lock(&state.db_connection)?;

    get_user(&user_id, &connection).map(Json)
}
