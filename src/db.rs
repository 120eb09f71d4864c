//! Database initialisation and access to the shared connection.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, auth::create_session_table, budget::create_budget_table,
    expense::create_expense_table, user::create_user_table,
};

/// The database connection shared between request handlers.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Create the tables for the domain models if they do not exist.
///
/// Foreign key enforcement is switched on for `connection` so that deleting a
/// user cascades to their expenses and budgets.
///
/// # Errors
///
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys cannot be toggled inside a transaction.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_session_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared connection.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock(connection: &SharedConnection) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&connection), Ok(()));
        assert_eq!(initialize(&connection), Ok(()));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert!(enabled);
    }
}
