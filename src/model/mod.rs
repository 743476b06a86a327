//! Types that represent the core data model: `Category`, `Transaction` and `Budget`, plus the
//! `Labeled` read projection that carries a category's display name.
mod budget;
mod category;
mod labeled;
mod transaction;

pub use budget::{Budget, BudgetKey};
pub use category::Category;
pub use labeled::{Labeled, UNCATEGORIZED};
pub use transaction::Transaction;

/// Returns the `YYYY-MM` bucket of a `YYYY-MM-DD` date. This is the literal first seven characters;
/// a shorter string is its own bucket.
pub fn month_of(date: &str) -> &str {
    date.get(..7).unwrap_or(date)
}
