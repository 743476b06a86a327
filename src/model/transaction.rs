use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single income or expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    /// Positive and unique. A non-positive id asks the store to assign one.
    pub id: i32,
    /// Expected as `YYYY-MM-DD`. Not validated; month bucketing uses the literal prefix.
    pub date: String,
    /// Non-negative. The direction comes from `is_income`.
    pub amount: Decimal,
    pub description: String,
    /// May refer to a category that does not exist.
    pub category_id: i32,
    pub is_income: bool,
}

impl Transaction {
    /// A transaction without an id, ready to be added.
    pub fn new(
        date: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
        category_id: i32,
        is_income: bool,
    ) -> Self {
        Self {
            id: 0,
            date: date.into(),
            amount,
            description: description.into(),
            category_id,
            is_income,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// True when the date falls in `month_year`, judged by string prefix.
    pub fn in_month(&self, month_year: &str) -> bool {
        self.date.starts_with(month_year)
    }

    /// The amount with income positive and expense negative.
    pub fn signed_amount(&self) -> Decimal {
        if self.is_income {
            self.amount
        } else {
            -self.amount
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction [ID: {}, Date: {}, Amount: {:.2}, Description: {}, Category ID: {}, Type: {}]",
            self.id,
            self.date,
            self.amount,
            self.description,
            self.category_id,
            if self.is_income { "Income" } else { "Expense" }
        )
    }
}
