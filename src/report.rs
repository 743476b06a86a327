//! Monthly aggregates computed from whatever a `Storage` returns. Nothing here is stored; every
//! figure is recomputed from the transactions on each call.

use crate::model::{month_of, Transaction};
use crate::store::Storage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Income, expense and balance for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub month_year: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// How one budget stands against the month's spending in its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub category_id: i32,
    pub category_name: String,
    pub month_year: String,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
}

fn sum<'a>(transactions: impl IntoIterator<Item = &'a Transaction>, is_income: bool) -> Decimal {
    transactions
        .into_iter()
        .filter(|t| t.is_income == is_income)
        .map(|t| t.amount)
        .sum()
}

fn month_transactions(store: &dyn Storage, month_year: &str) -> Vec<Transaction> {
    store
        .transactions_by_month(month_year)
        .into_iter()
        .map(|t| t.into_record())
        .collect()
}

/// Sum of income amounts for transactions in `month_year`.
pub fn total_income(store: &dyn Storage, month_year: &str) -> Decimal {
    sum(&month_transactions(store, month_year), true)
}

/// Sum of expense amounts for transactions in `month_year`.
pub fn total_expense(store: &dyn Storage, month_year: &str) -> Decimal {
    sum(&month_transactions(store, month_year), false)
}

/// Income minus expense for `month_year`.
pub fn balance(store: &dyn Storage, month_year: &str) -> Decimal {
    summary(store, month_year).balance
}

pub fn summary(store: &dyn Storage, month_year: &str) -> Summary {
    let transactions = month_transactions(store, month_year);
    let income = sum(&transactions, true);
    let expense = sum(&transactions, false);
    Summary {
        month_year: month_year.to_string(),
        income,
        expense,
        balance: income - expense,
    }
}

/// The signed total for every known category in `month_year`. Categories with no transactions are
/// present with zero; transactions whose category does not exist are left out.
pub fn category_totals(store: &dyn Storage, month_year: &str) -> BTreeMap<i32, Decimal> {
    let mut totals: BTreeMap<i32, Decimal> = store
        .categories()
        .into_iter()
        .map(|c| (c.id, Decimal::ZERO))
        .collect();
    for t in month_transactions(store, month_year) {
        if let Some(total) = totals.get_mut(&t.category_id) {
            *total += t.signed_amount();
        }
    }
    totals
}

/// The signed total of `month_year` transactions that reference `category_id`, whether or not the
/// category still exists.
pub fn category_total(store: &dyn Storage, category_id: i32, month_year: &str) -> Decimal {
    month_transactions(store, month_year)
        .iter()
        .filter(|t| t.category_id == category_id)
        .map(Transaction::signed_amount)
        .sum()
}

/// Cumulative income (or expense) per `YYYY-MM` month across all transactions. Only months that
/// have a matching transaction appear.
pub fn monthly_totals(store: &dyn Storage, is_income: bool) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for t in store.transactions() {
        if t.is_income == is_income {
            *totals.entry(month_of(&t.date).to_string()).or_insert(Decimal::ZERO) += t.amount;
        }
    }
    totals
}

/// Each budget in `month_year` next to the expenses recorded against its category that month.
pub fn budget_status(store: &dyn Storage, month_year: &str) -> Vec<BudgetStatus> {
    let transactions = month_transactions(store, month_year);
    store
        .budgets_by_month(month_year)
        .into_iter()
        .map(|budget| {
            let spent = sum(
                transactions
                    .iter()
                    .filter(|t| t.category_id == budget.category_id),
                false,
            );
            BudgetStatus {
                category_id: budget.category_id,
                category_name: budget.category_name().to_string(),
                month_year: budget.month_year.clone(),
                allocated: budget.allocated_amount,
                spent,
                remaining: budget.allocated_amount - spent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Budget, Category};
    use crate::store::{DocumentStore, EngineApi, EngineStore};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn seeded(store: &mut dyn Storage) {
        store.add_category(&Category::new("Food", "", "#fff")).unwrap();
        store.add_category(&Category::new("Salary", "", "#0f0")).unwrap();
        store.add_category(&Category::new("Travel", "", "#00f")).unwrap();
        for (date, amount, category_id, is_income) in [
            ("2024-03-05", dec!(50.0), 1, false),
            ("2024-03-20", dec!(25.5), 1, false),
            ("2024-03-01", dec!(3000.0), 2, true),
            ("2024-03-15", dec!(10.0), 9, false),
            ("2024-04-02", dec!(40.0), 1, false),
            ("2024-04-30", dec!(3000.0), 2, true),
            ("2024", dec!(1.0), 1, false),
        ] {
            store
                .add_transaction(&Transaction::new(date, amount, "", category_id, is_income))
                .unwrap();
        }
        store.add_budget(&Budget::new(1, "2024-03", dec!(100.0))).unwrap();
        store.add_budget(&Budget::new(3, "2024-03", dec!(500.0))).unwrap();
    }

    #[test]
    fn test_first_expense() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        assert_eq!(store.add_category(&Category::new("Food", "", "#fff")).unwrap(), 1);
        let txn = Transaction::new("2024-03-05", dec!(50.0), "", 1, false);
        assert_eq!(store.add_transaction(&txn).unwrap(), 1);

        assert_eq!(total_expense(&store, "2024-03"), dec!(50.0));
        assert_eq!(total_income(&store, "2024-03"), dec!(0.0));
        assert_eq!(category_totals(&store, "2024-03")[&1], dec!(-50.0));
        assert_eq!(balance(&store, "2024-03"), dec!(-50.0));
    }

    #[test]
    fn test_month_figures() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        seeded(&mut store);

        let march = summary(&store, "2024-03");
        assert_eq!(march.income, dec!(3000.0));
        assert_eq!(march.expense, dec!(85.5));
        assert_eq!(march.balance, dec!(2914.5));

        let totals = category_totals(&store, "2024-03");
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[&1], dec!(-75.5));
        assert_eq!(totals[&2], dec!(3000.0));
        assert_eq!(totals[&3], dec!(0.0));
        assert!(!totals.contains_key(&9));

        assert_eq!(category_total(&store, 9, "2024-03"), dec!(-10.0));
        assert_eq!(category_total(&store, 1, "2024-05"), dec!(0.0));
    }

    #[test]
    fn test_monthly_totals() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        seeded(&mut store);

        let expenses = monthly_totals(&store, false);
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses["2024-03"], dec!(85.5));
        assert_eq!(expenses["2024-04"], dec!(40.0));
        assert_eq!(expenses["2024"], dec!(1.0));

        let income = monthly_totals(&store, true);
        assert_eq!(income.keys().collect::<Vec<_>>(), vec!["2024-03", "2024-04"]);
    }

    #[test]
    fn test_budget_status() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        seeded(&mut store);

        let status = budget_status(&store, "2024-03");
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].category_name, "Food");
        assert_eq!(status[0].spent, dec!(75.5));
        assert_eq!(status[0].remaining, dec!(24.5));
        assert_eq!(status[1].spent, dec!(0.0));
        assert_eq!(status[1].remaining, dec!(500.0));
        assert!(budget_status(&store, "2024-04").is_empty());
    }

    #[test]
    fn test_backends_agree() {
        let dir = TempDir::new().unwrap();
        let mut document = DocumentStore::open(dir.path().join("document")).unwrap();
        let mut engine = EngineStore::open(EngineApi::linked(), &dir.path().join("engine")).unwrap();
        seeded(&mut document);
        seeded(&mut engine);
        for month in ["2024-03", "2024-04", "2024"] {
            assert_eq!(summary(&document, month), summary(&engine, month));
            assert_eq!(
                category_totals(&document, month),
                category_totals(&engine, month)
            );
            assert_eq!(budget_status(&document, month), budget_status(&engine, month));
        }
        assert_eq!(monthly_totals(&document, true), monthly_totals(&engine, true));
    }

    #[test]
    fn test_engine_totals_match() {
        let dir = TempDir::new().unwrap();
        let mut engine = EngineStore::open(EngineApi::linked(), dir.path()).unwrap();
        seeded(&mut engine);
        for month in ["2024-03", "2024-04", "2024-05", "2024"] {
            assert_eq!(
                engine.engine_total(month, true).unwrap(),
                total_income(&engine, month)
            );
            assert_eq!(
                engine.engine_total(month, false).unwrap(),
                total_expense(&engine, month)
            );
            assert_eq!(
                engine.engine_category_totals(month).unwrap(),
                category_totals(&engine, month)
            );
        }
    }

    #[test]
    fn test_cents_add_up_exactly() {
        let dir = TempDir::new().unwrap();
        let mut store = DocumentStore::open(dir.path()).unwrap();
        for amount in [dec!(0.1), dec!(0.2), dec!(0.7)] {
            store
                .add_transaction(&Transaction::new("2024-03-05", amount, "", 1, false))
                .unwrap();
        }
        assert_eq!(total_expense(&store, "2024-03"), dec!(1.0));
        assert_eq!(category_total(&store, 1, "2024-03"), dec!(-1.0));
        assert_eq!(monthly_totals(&store, false)["2024-03"], dec!(1.0));
    }
}
