//! Aggregated views of a user's spending.

mod handlers;
mod queries;

pub use handlers::{
    get_category_totals_endpoint, get_daily_totals_endpoint, get_monthly_total_endpoint,
    get_monthly_totals_endpoint,
};
pub use queries::{
    CategoryTotal, DailyTotal, MonthlyTotal, get_category_totals, get_daily_expense_totals,
    get_monthly_expense_total, get_monthly_totals,
};
