use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The amount allocated to one category for one month. A budget has no id of its own; it is
/// identified by its `BudgetKey`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budget {
    pub category_id: i32,
    /// Format: "YYYY-MM"
    pub month_year: String,
    pub allocated_amount: Decimal,
}

impl Budget {
    pub fn new(category_id: i32, month_year: impl Into<String>, allocated_amount: Decimal) -> Self {
        Self {
            category_id,
            month_year: month_year.into(),
            allocated_amount,
        }
    }

    pub fn key(&self) -> BudgetKey {
        BudgetKey::new(self.category_id, self.month_year.clone())
    }

    pub fn has_key(&self, key: &BudgetKey) -> bool {
        self.category_id == key.category_id && self.month_year == key.month_year
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Budget [Category ID: {}, Month/Year: {}, Allocated Amount: {:.2}]",
            self.category_id, self.month_year, self.allocated_amount
        )
    }
}

/// The composite identity of a `Budget`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetKey {
    pub category_id: i32,
    pub month_year: String,
}

impl BudgetKey {
    pub fn new(category_id: i32, month_year: impl Into<String>) -> Self {
        Self {
            category_id,
            month_year: month_year.into(),
        }
    }
}

impl fmt::Display for BudgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category {} in {}", self.category_id, self.month_year)
    }
}
