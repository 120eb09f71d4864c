//! Core expense domain types and their validation.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::{
    category::Category,
    date_format::iso_date,
    money::Amount,
    user::UserId,
    validation::{FieldReader, ValidationErrors, parse_date, parse_string, parse_text},
};

/// The longest title an expense may have, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Opaque identifier for an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    /// Create an expense ID from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new, random expense ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for ExpenseId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for ExpenseId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(ExpenseId::new)
    }
}

/// Money that a user has spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The expense's ID.
    pub id: ExpenseId,
    /// The user that owns the expense.
    pub user_id: UserId,
    /// A short summary of what the money was spent on.
    pub title: String,
    /// How much was spent.
    pub amount: Amount,
    /// What kind of spending this was.
    pub category: Category,
    /// The day the money was spent.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Optional free-form notes.
    pub description: Option<String>,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The client supplied fields of a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// A short summary of what the money was spent on.
    pub title: String,
    /// How much was spent.
    pub amount: Amount,
    /// What kind of spending this was.
    pub category: Category,
    /// The day the money was spent.
    pub date: Date,
    /// Optional free-form notes.
    pub description: Option<String>,
}

impl NewExpense {
    /// Validate a JSON request body.
    ///
    /// # Errors
    ///
    /// Returns the list of fields that are missing or invalid.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;

        let title = reader.required("title", |value| parse_text(value, MAX_TITLE_LENGTH));
        let amount = reader.required("amount", Amount::from_json);
        let category = reader.required("category", Category::from_json);
        let date = reader.required("date", parse_date);
        let description = reader.optional("description", parse_string);

        reader.finish(|| {
            Some(Self {
                title: title?,
                amount: amount?,
                category: category?,
                date: date?,
                description,
            })
        })
    }
}

/// A partial update to an expense. Fields that are `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    /// A new title.
    pub title: Option<String>,
    /// A new amount.
    pub amount: Option<Amount>,
    /// A new category.
    pub category: Option<Category>,
    /// A new date.
    pub date: Option<Date>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl ExpensePatch {
    /// Validate a JSON request body where every field is optional.
    ///
    /// # Errors
    ///
    /// Returns the list of fields that are invalid.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;

        let title = reader.patch("title", false, |value| parse_text(value, MAX_TITLE_LENGTH));
        let amount = reader.patch("amount", false, Amount::from_json);
        let category = reader.patch("category", false, Category::from_json);
        let date = reader.patch("date", false, parse_date);
        let description = reader.patch("description", true, parse_string);

        reader.finish(|| {
            Some(Self {
                title: title.flatten(),
                amount: amount.flatten(),
                category: category.flatten(),
                date: date.flatten(),
                description,
            })
        })
    }

    /// Overwrite the fields of `expense` that are set in this patch.
    pub fn apply_to(self, expense: &mut Expense) {
        if let Some(title) = self.title {
            expense.title = title;
        }

        if let Some(amount) = self.amount {
            expense.amount = amount;
        }

        if let Some(category) = self.category {
            expense.category = category;
        }

        if let Some(date) = self.date {
            expense.date = date;
        }

        if let Some(description) = self.description {
            expense.description = description;
        }
    }
}
