//! The closed set of categories that expenses and budgets are filed under.

use std::{fmt::Display, str::FromStr};

use axum::Json;
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::type_name;

/// A category for classifying expenses and budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Groceries, restaurants and takeaways.
    Food,
    /// Fuel, fares and vehicle costs.
    Transportation,
    /// Going out, subscriptions and hobbies.
    Entertainment,
    /// Clothes and other goods.
    Shopping,
    /// Power, water, internet and phone bills.
    Utilities,
    /// Doctors, dentists and medicine.
    Healthcare,
    /// Courses, books and tuition.
    Education,
    /// Everything else.
    Other,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Shopping,
        Category::Utilities,
        Category::Healthcare,
        Category::Education,
        Category::Other,
    ];

    /// The lowercase name used in JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transportation => "transportation",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Utilities => "utilities",
            Category::Healthcare => "healthcare",
            Category::Education => "education",
            Category::Other => "other",
        }
    }

    /// Parse a category from a JSON value, which must be one of the category
    /// names exactly.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(name) => name.parse(),
            other => Err(format!("Expected string, received {}", type_name(other))),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                let expected: Vec<String> = Category::ALL
                    .iter()
                    .map(|category| format!("'{}'", category.as_str()))
                    .collect();

                format!(
                    "Invalid enum value. Expected {}, received '{s}'",
                    expected.join(" | ")
                )
            })
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let name = value.as_str()?;

        name.parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The SQL `CHECK` constraint listing every category, for use in table definitions.
pub(crate) fn category_check(column: &str) -> String {
    let names: Vec<String> = Category::ALL
        .iter()
        .map(|category| format!("'{}'", category.as_str()))
        .collect();

    format!("CHECK ({column} IN ({}))", names.join(", "))
}

/// Route handler listing the available categories.
pub async fn get_categories() -> Json<[Category; 8]> {
    Json(Category::ALL)
}
