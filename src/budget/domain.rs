//! Core budget domain types and their validation.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    category::Category,
    money::Amount,
    month::YearMonth,
    user::UserId,
    validation::{FieldReader, ValidationErrors},
};

/// Opaque identifier for a budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct BudgetId(String);

impl BudgetId {
    /// Create a budget ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new, random budget ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Display for BudgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for BudgetId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for BudgetId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(BudgetId::new)
    }
}

/// A spending limit for one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The budget's ID.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserId,
    /// The category the limit applies to.
    pub category: Category,
    /// The spending limit for the month.
    pub amount: Amount,
    /// The month the limit applies to.
    pub month: YearMonth,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The client supplied fields of a new budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The category the limit applies to.
    pub category: Category,
    /// The spending limit for the month.
    pub amount: Amount,
    /// The month the limit applies to.
    pub month: YearMonth,
}

impl NewBudget {
    /// Validate a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns the list of fields that are missing or invalid.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;

        let category = reader.required("category", Category::from_json);
        let amount = reader.required("amount", Amount::from_json);
        let month = reader.required("month", YearMonth::from_json);

        reader.finish(|| {
            Some(Self {
                category: category?,
                amount: amount?,
                month: month?,
            })
        })
    }
}

/// A partial update to a budget. Fields that are `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetPatch {
    /// A new category.
    pub category: Option<Category>,
    /// A new spending limit.
    pub amount: Option<Amount>,
    /// A new month.
    pub month: Option<YearMonth>,
}

impl BudgetPatch {
    /// Validate a JSON request body where every field is optional.
    ///
    /// # Errors
    ///
    /// Returns the list of fields that are invalid.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;

        let category = reader.patch("category", false, Category::from_json);
        let amount = reader.patch("amount", false, Amount::from_json);
        let month = reader.patch("month", false, YearMonth::from_json);

        reader.finish(|| {
            Some(Self {
                category: category.flatten(),
                amount: amount.flatten(),
                month: month.flatten(),
            })
        })
    }

    /// Overwrite the fields of `budget` that are set in this patch.
    pub fn apply_to(self, budget: &mut Budget) {
        if let Some(category) = self.category {
            budget.category = category;
        }

        if let Some(amount) = self.amount {
            budget.amount = amount;
        }

        if let Some(month) = self.month {
            budget.month = month;
        }
    }
}
