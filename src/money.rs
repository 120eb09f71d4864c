//! Exact monetary amounts.
//!
//! Amounts are stored in the database as an integer number of cents so that
//! sums computed by SQLite are exact, and are exchanged with clients as
//! decimal strings with two decimal places, e.g. "4.50".

use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::validation::type_name;

/// The number of decimal places kept for amounts.
const SCALE: u32 = 2;

/// Amounts must be strictly below this many whole units, matching a decimal
/// column with a precision of ten digits and a scale of two.
const MAX_WHOLE_UNITS: i64 = 100_000_000;

/// A non-negative amount of money with exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount, "0.00".
    pub const ZERO: Amount = Amount(Decimal::from_parts(0, 0, 0, false, SCALE));

    /// Create an amount from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, SCALE))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        // The scale is fixed at two and the magnitude is bounded by
        // [MAX_WHOLE_UNITS] or by an `i64` of cents read from the database.
        i64::try_from(self.0.mantissa()).unwrap_or(i64::MAX)
    }

    /// The amount as a decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Parse an amount from a JSON value, which must be a decimal string.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if `value` is not a string holding
    /// a valid amount.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(text) => text.parse(),
            other => Err(format!(
                "Expected a decimal string, received {}",
                type_name(other)
            )),
        }
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut decimal = Decimal::from_str_exact(s.trim())
            .map_err(|_| format!("\"{s}\" is not a valid decimal number"))?;

        if decimal.is_sign_negative() && !decimal.is_zero() {
            return Err("Amount must not be negative".to_owned());
        }

        if decimal.normalize().scale() > SCALE {
            return Err(format!("Amount must have at most {SCALE} decimal places"));
        }

        if decimal >= Decimal::from(MAX_WHOLE_UNITS) {
            return Err(format!("Amount must be less than {MAX_WHOLE_UNITS}"));
        }

        decimal.set_sign_positive(true);
        decimal.rescale(SCALE);

        Ok(Self(decimal))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
