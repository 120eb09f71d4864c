//! Expenses: money a user has spent, and the endpoints for managing them.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_expense_endpoint;
pub use db::{
    DEFAULT_PAGE_SIZE, create_expense, create_expense_table, delete_expense,
    delete_expense_for_owner, get_expense_by_id, get_expense_for_owner, get_expenses_by_category,
    get_expenses_by_date_range, get_expenses_by_owner, update_expense, update_expense_for_owner,
};
pub use delete::delete_expense_endpoint;
pub use domain::{Expense, ExpenseId, ExpensePatch, MAX_TITLE_LENGTH, NewExpense};
pub use edit::update_expense_endpoint;
pub use list::{get_expense_endpoint, get_expenses_endpoint};
