//! Database operations for expenses.
//!
//! The functions without an owner argument do not check who owns the expense.
//! Route handlers use the `*_for_owner` variants, which refuse to touch
//! another user's expenses.

use rusqlite::{Connection, Row, params};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::{Category, category_check},
    expense::{Expense, ExpenseId, ExpensePatch, NewExpense},
    user::UserId,
};

/// The number of expenses returned by [get_expenses_by_owner] when no limit is given.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

const EXPENSE_COLUMNS: &str =
    "id, user_id, title, amount, category, date, description, created_at, updated_at";

/// Insert a new expense owned by `owner` and return the stored row.
///
/// # Errors
///
/// Returns an [Error::SqlError] if `owner` is not a registered user or there is
/// some other SQL error.
pub fn create_expense(
    owner: &UserId,
    expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO expense ({EXPENSE_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            params![
                ExpenseId::generate(),
                owner,
                expense.title,
                expense.amount.cents(),
                expense.category,
                expense.date,
                expense.description,
                now,
            ],
            map_row,
        )
        .map_err(Error::from)
}

/// Get the expenses owned by `owner`, most recent first.
///
/// At most `limit` expenses are returned, or [DEFAULT_PAGE_SIZE] if `limit` is
/// `None`. There is no way to fetch the expenses after the first page.
pub fn get_expenses_by_owner(
    owner: &UserId,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
            WHERE user_id = ?1
            ORDER BY date DESC, created_at DESC
            LIMIT ?2"
        ))?
        .query_map(params![owner, limit], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Retrieve a single expense by ID, regardless of who owns it.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no expense with the ID `id`.
pub fn get_expense_by_id(id: &ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id"
        ))?
        .query_row(&[(":id", id)], map_row)
        .map_err(Error::from)
}

/// Apply `patch` to the expense with the ID `id` and return the updated row.
///
/// The update time is refreshed even if the patch is empty.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no expense with the ID `id`.
pub fn update_expense(
    id: &ExpenseId,
    patch: ExpensePatch,
    connection: &Connection,
) -> Result<Expense, Error> {
    let mut expense = get_expense_by_id(id, connection)?;
    patch.apply_to(&mut expense);

    connection
        .prepare(&format!(
            "UPDATE expense
            SET title = ?1, amount = ?2, category = ?3, date = ?4, description = ?5, updated_at = ?6
            WHERE id = ?7
            RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            params![
                expense.title,
                expense.amount.cents(),
                expense.category,
                expense.date,
                expense.description,
                OffsetDateTime::now_utc(),
                id,
            ],
            map_row,
        )
        .map_err(Error::from)
}

/// Delete the expense with the ID `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no expense with the ID `id`.
pub fn delete_expense(id: &ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the expenses owned by `owner` dated between `start` and `end` inclusive,
/// most recent first.
pub fn get_expenses_by_date_range(
    owner: &UserId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            ORDER BY date DESC, created_at DESC"
        ))?
        .query_map(params![owner, start, end], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the expenses owned by `owner` in `category`, most recent first.
pub fn get_expenses_by_category(
    owner: &UserId,
    category: Category,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
            WHERE user_id = ?1 AND category = ?2
            ORDER BY date DESC, created_at DESC"
        ))?
        .query_map(params![owner, category], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Retrieve the expense with the ID `id` if it belongs to `owner`.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if there is no expense with the ID `id`,
/// - [Error::AccessDenied] if the expense belongs to another user.
pub fn get_expense_for_owner(
    id: &ExpenseId,
    owner: &UserId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = get_expense_by_id(id, connection)?;

    if &expense.user_id != owner {
        tracing::warn!("user {owner} tried to access expense {id} owned by another user");
        return Err(Error::AccessDenied);
    }

    Ok(expense)
}

/// Apply `patch` to the expense with the ID `id` if it belongs to `owner`.
///
/// # Errors
///
/// Same as [get_expense_for_owner].
pub fn update_expense_for_owner(
    id: &ExpenseId,
    owner: &UserId,
    patch: ExpensePatch,
    connection: &Connection,
) -> Result<Expense, Error> {
    get_expense_for_owner(id, owner, connection)?;

    update_expense(id, patch, connection)
}

/// Delete the expense with the ID `id` if it belongs to `owner`.
///
/// # Errors
///
/// Same as [get_expense_for_owner].
pub fn delete_expense_for_owner(
    id: &ExpenseId,
    owner: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    get_expense_for_owner(id, owner, connection)?;

    delete_expense(id, connection)
}

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS expense (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            category TEXT NOT NULL {},
            date TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        category_check("category")
    ))?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let cents: i64 = row.get(3)?;

    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        amount: crate::money::Amount::from_cents(cents),
        category: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
