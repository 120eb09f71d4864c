//! Monthly spending limits per category.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::set_budget_endpoint;
pub use db::{
    SetBudgetOutcome, create_budget, create_budget_table, delete_budget, delete_budget_for_owner,
    get_budget_by_id, get_budget_by_owner_category_month, get_budget_for_owner,
    get_budgets_by_owner, set_budget, update_budget, update_budget_for_owner,
};
pub use delete::delete_budget_endpoint;
pub use domain::{Budget, BudgetId, BudgetPatch, NewBudget};
pub use edit::update_budget_endpoint;
pub use list::{get_budget_endpoint, get_budgets_endpoint};
