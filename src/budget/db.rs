//! Database operations for budgets.
//!
//! As with expenses, the functions without an owner argument do not check who
//! owns the budget and route handlers use the `*_for_owner` variants.

use rusqlite::{Connection, Row, params};
use time::OffsetDateTime;

use crate::{
    Error,
    budget::{Budget, BudgetId, BudgetPatch, NewBudget},
    category::{Category, category_check},
    money::Amount,
    month::YearMonth,
    user::UserId,
};

const BUDGET_COLUMNS: &str = "id, user_id, category, amount, month, created_at, updated_at";

/// Whether [set_budget] inserted a new budget or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetBudgetOutcome {
    /// No budget existed for the category and month.
    Created,
    /// The amount of the existing budget was replaced.
    Updated,
}

/// Insert a new budget owned by `owner` and return the stored row.
///
/// # Errors
///
/// Returns [Error::DuplicateBudget] if `owner` already has a budget for the
/// same category and month.
pub fn create_budget(
    owner: &UserId,
    budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO budget ({BUDGET_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            params![
                BudgetId::generate(),
                owner,
                budget.category,
                budget.amount.cents(),
                budget.month,
                OffsetDateTime::now_utc(),
            ],
            map_row,
        )
        .map_err(Error::from)
}

/// Create the budget for the category and month in `budget`, or change the
/// amount of the existing one.
///
/// The insert and update happen in a single statement, so concurrent calls for
/// the same category and month never create two budgets.
pub fn set_budget(
    owner: &UserId,
    budget: NewBudget,
    connection: &Connection,
) -> Result<(Budget, SetBudgetOutcome), Error> {
    let new_id = BudgetId::generate();

    let stored = connection
        .prepare(&format!(
            "INSERT INTO budget ({BUDGET_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(user_id, category, month) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            params![
                new_id,
                owner,
                budget.category,
                budget.amount.cents(),
                budget.month,
                OffsetDateTime::now_utc(),
            ],
            map_row,
        )?;

    let outcome = if stored.id == new_id {
        SetBudgetOutcome::Created
    } else {
        SetBudgetOutcome::Updated
    };

    Ok((stored, outcome))
}

/// Get the budgets owned by `owner`, latest month first and then by category.
pub fn get_budgets_by_owner(owner: &UserId, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
            WHERE user_id = ?1
            ORDER BY month DESC, category ASC"
        ))?
        .query_map([owner], map_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Get the budget `owner` set for `category` in `month`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such budget.
pub fn get_budget_by_owner_category_month(
    owner: &UserId,
    category: Category,
    month: YearMonth,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget
            WHERE user_id = ?1 AND category = ?2 AND month = ?3"
        ))?
        .query_row(params![owner, category, month], map_row)
        .map_err(Error::from)
}

/// Retrieve a single budget by ID, regardless of who owns it.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no budget with the ID `id`.
pub fn get_budget_by_id(id: &BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!("SELECT {BUDGET_COLUMNS} FROM budget WHERE id = :id"))?
        .query_row(&[(":id", id)], map_row)
        .map_err(Error::from)
}

/// Apply `patch` to the budget with the ID `id` and return the updated row.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if there is no budget with the ID `id`,
/// - [Error::DuplicateBudget] if the owner already has another budget for the
///   patched category and month.
pub fn update_budget(
    id: &BudgetId,
    patch: BudgetPatch,
    connection: &Connection,
) -> Result<Budget, Error> {
    let mut budget = get_budget_by_id(id, connection)?;
    patch.apply_to(&mut budget);

    connection
        .prepare(&format!(
            "UPDATE budget
            SET category = ?1, amount = ?2, month = ?3, updated_at = ?4
            WHERE id = ?5
            RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            params![
                budget.category,
                budget.amount.cents(),
                budget.month,
                OffsetDateTime::now_utc(),
                id,
            ],
            map_row,
        )
        .map_err(Error::from)
}

/// Delete the budget with the ID `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no budget with the ID `id`.
pub fn delete_budget(id: &BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Retrieve the budget with the ID `id` if it belongs to `owner`.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if there is no budget with the ID `id`,
/// - [Error::AccessDenied] if the budget belongs to another user.
pub fn get_budget_for_owner(
    id: &BudgetId,
    owner: &UserId,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = get_budget_by_id(id, connection)?;

    if &budget.user_id != owner {
        tracing::warn!("user {owner} tried to access budget {id} owned by another user");
        return Err(Error::AccessDenied);
    }

    Ok(budget)
}

/// Apply `patch` to the budget with the ID `id` if it belongs to `owner`.
///
/// # Errors
///
/// Same as [get_budget_for_owner] and [update_budget].
pub fn update_budget_for_owner(
    id: &BudgetId,
    owner: &UserId,
    patch: BudgetPatch,
    connection: &Connection,
) -> Result<Budget, Error> {
    get_budget_for_owner(id, owner, connection)?;

    update_budget(id, patch, connection)
}

/// Delete the budget with the ID `id` if it belongs to `owner`.
///
/// # Errors
///
/// Same as [get_budget_for_owner].
pub fn delete_budget_for_owner(
    id: &BudgetId,
    owner: &UserId,
    connection: &Connection,
) -> Result<(), Error> {
    get_budget_for_owner(id, owner, connection)?;

    delete_budget(id, connection)
}

/// Initialize the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS budget (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                category TEXT NOT NULL {},
                amount INTEGER NOT NULL CHECK (amount >= 0),
                month TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, category, month),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
            )",
            category_check("category")
        ),
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let cents: i64 = row.get(3)?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: row.get(2)?,
        amount: Amount::from_cents(cents),
        month: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
