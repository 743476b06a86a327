//! The storage contract and its two backends.
//!
//! Everything above this module talks to a `Box<dyn Storage>` obtained from [`open`]. The concrete
//! backend is chosen once, when the store is opened, and used exclusively from then on.

mod document;
mod engine;
#[cfg(test)]
mod parity;
pub(crate) mod records;
mod select;

pub use document::DocumentStore;
pub use engine::{EngineApi, EngineStore, Ownership};
pub use select::{open, open_with};

use crate::error::StoreError;
use crate::model::{Budget, BudgetKey, Category, Labeled, Transaction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const CATEGORIES_JSON: &str = "categories.json";
pub(crate) const TRANSACTIONS_JSON: &str = "transactions.json";
pub(crate) const BUDGETS_JSON: &str = "budgets.json";

/// The result of a mutation.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Which concrete backend is behind a `Storage`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON documents read and written directly by this crate.
    #[default]
    Document,
    /// The native engine reached through its C surface.
    Engine,
}

serde_plain::derive_display_from_serialize!(BackendKind);
serde_plain::derive_fromstr_from_deserialize!(BackendKind);

/// Which backend the caller would like [`open`] to use.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    /// Try the engine and fall back to documents if it cannot be opened.
    #[default]
    Auto,
    /// Require the engine. Failing to open it is an error.
    Engine,
    /// Use documents without trying the engine.
    Document,
}

serde_plain::derive_display_from_serialize!(BackendPreference);
serde_plain::derive_fromstr_from_deserialize!(BackendPreference);

/// The operations every backend provides over categories, transactions and budgets.
///
/// Reads never fail: a collection that cannot be read is logged and comes back empty. Mutations
/// report duplicates and missing records as a `StoreError` and leave the collection unchanged when
/// they do. Ids that are zero or negative on `add_*` are replaced with the next free id.
///
/// Transactions and budgets are read as `Labeled` records carrying their category's name, which is
/// resolved on every read. Writes take the bare record.
pub trait Storage {
    fn kind(&self) -> BackendKind;

    fn categories(&self) -> Vec<Category>;

    fn category(&self, id: i32) -> Option<Category> {
        self.categories().into_iter().find(|c| c.id == id)
    }

    /// Adds `category` and returns the id it was stored under.
    fn add_category(&mut self, category: &Category) -> StoreResult<i32>;

    fn update_category(&mut self, category: &Category) -> StoreResult<()>;

    /// Removes a category. Transactions and budgets that reference it are left in place.
    fn delete_category(&mut self, id: i32) -> StoreResult<()>;

    fn transactions(&self) -> Vec<Labeled<Transaction>>;

    fn transaction(&self, id: i32) -> Option<Labeled<Transaction>> {
        self.transactions().into_iter().find(|t| t.id == id)
    }

    /// Transactions whose date begins with `month_year`.
    fn transactions_by_month(&self, month_year: &str) -> Vec<Labeled<Transaction>>;

    fn transactions_by_category(&self, category_id: i32) -> Vec<Labeled<Transaction>>;

    /// Adds `transaction` and returns the id it was stored under.
    fn add_transaction(&mut self, transaction: &Transaction) -> StoreResult<i32>;

    fn update_transaction(&mut self, transaction: &Transaction) -> StoreResult<()>;

    fn delete_transaction(&mut self, id: i32) -> StoreResult<()>;

    fn budgets(&self) -> Vec<Labeled<Budget>>;

    fn budget(&self, key: &BudgetKey) -> Option<Labeled<Budget>> {
        self.budgets().into_iter().find(|b| b.has_key(key))
    }

    /// Budgets whose month is exactly `month_year`.
    fn budgets_by_month(&self, month_year: &str) -> Vec<Labeled<Budget>>;

    fn add_budget(&mut self, budget: &Budget) -> StoreResult<()>;

    fn update_budget(&mut self, budget: &Budget) -> StoreResult<()>;

    fn delete_budget(&mut self, key: &BudgetKey) -> StoreResult<()>;
}

/// A record with a surrogate id.
pub(crate) trait Identified {
    fn id(&self) -> i32;
    fn set_id(&mut self, id: i32);
}

impl Identified for Category {
    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

impl Identified for Transaction {
    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

/// One more than the largest id in `items`, or 1 when there are none. There is no next id once
/// `i32::MAX` is taken.
pub(crate) fn next_id<T: Identified>(items: &[T]) -> StoreResult<i32> {
    match items.iter().map(Identified::id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidArgument(format!("no id is left after {max}"))),
    }
}

/// Refuses an amount that a document could not hold as a JSON number and read back.
pub(crate) fn check_amount(field: &str, amount: Decimal) -> StoreResult<()> {
    match amount.to_f64() {
        Some(value) if budget_engine::amount_in_range(value) => Ok(()),
        _ => Err(StoreError::InvalidArgument(format!(
            "{field} {amount} is out of range"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_next_id() {
        assert_eq!(next_id::<Category>(&[]), Ok(1));
        let categories = vec![
            Category::new("a", "", "#fff").with_id(4),
            Category::new("b", "", "#fff").with_id(2),
        ];
        assert_eq!(next_id(&categories), Ok(5));
    }

    #[test]
    fn test_next_id_after_max() {
        let categories = vec![Category::new("a", "", "#fff").with_id(i32::MAX)];
        assert!(matches!(
            next_id(&categories),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_check_amount() {
        assert!(check_amount("amount", dec!(0)).is_ok());
        assert!(check_amount("amount", dec!(-12.34)).is_ok());
        assert!(check_amount("amount", Decimal::from(i64::MAX)).is_ok());
        assert!(matches!(
            check_amount("amount", Decimal::MAX),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_preference_from_str() {
        assert_eq!(
            BackendPreference::from_str("document").unwrap(),
            BackendPreference::Document
        );
        assert_eq!(BackendPreference::Auto.to_string(), "auto");
        assert!(BackendPreference::from_str("sqlite").is_err());
        assert_eq!(BackendKind::Engine.to_string(), "engine");
    }
}
