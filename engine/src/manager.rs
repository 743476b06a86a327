//! The engine's stateful data manager. Collections are loaded once when the manager is opened and
//! every mutation is written through to disk as a whole-document rewrite.

use crate::record::{decode, Budget, Category, Fields, Labeled, Transaction, UNCATEGORIZED};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub(crate) const CATEGORIES_JSON: &str = "categories.json";
pub(crate) const TRANSACTIONS_JSON: &str = "transactions.json";
pub(crate) const BUDGETS_JSON: &str = "budgets.json";

/// Why a mutation was refused.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Failure {
    Duplicate,
    NotFound,
    Persist,
    /// The arguments cannot be stored, such as an id past the largest one available.
    Invalid,
}

pub struct Manager {
    dir: PathBuf,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
}

impl Manager {
    /// Creates `dir` if needed and loads whatever collections it already holds.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let categories = load(&dir.join(CATEGORIES_JSON));
        let transactions = load(&dir.join(TRANSACTIONS_JSON));
        let budgets = load(&dir.join(BUDGETS_JSON));
        debug!(
            "Engine opened {} with {} categories, {} transactions, {} budgets",
            dir.display(),
            categories.len(),
            transactions.len(),
            budgets.len()
        );
        Ok(Self {
            dir,
            categories,
            transactions,
            budgets,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn add_category(&mut self, mut category: Category) -> Result<i32, Failure> {
        if category.id <= 0 {
            category.id = next_id(self.categories.iter().map(|c| c.id))?;
        }
        if self.categories.iter().any(|c| c.id == category.id) {
            return Err(Failure::Duplicate);
        }
        let id = category.id;
        let mut next = self.categories.clone();
        next.push(category);
        self.categories = self.persist(CATEGORIES_JSON, next)?;
        Ok(id)
    }

    pub fn update_category(&mut self, category: Category) -> Result<(), Failure> {
        let ix = position(&self.categories, |c| c.id == category.id)?;
        let mut next = self.categories.clone();
        next[ix] = category;
        self.categories = self.persist(CATEGORIES_JSON, next)?;
        Ok(())
    }

    pub fn delete_category(&mut self, id: i32) -> Result<(), Failure> {
        let ix = position(&self.categories, |c| c.id == id)?;
        let mut next = self.categories.clone();
        next.remove(ix);
        self.categories = self.persist(CATEGORIES_JSON, next)?;
        Ok(())
    }

    pub fn add_transaction(&mut self, mut transaction: Transaction) -> Result<i32, Failure> {
        if transaction.id <= 0 {
            transaction.id = next_id(self.transactions.iter().map(|t| t.id))?;
        }
        if self.transactions.iter().any(|t| t.id == transaction.id) {
            return Err(Failure::Duplicate);
        }
        let id = transaction.id;
        let mut next = self.transactions.clone();
        next.push(transaction);
        self.transactions = self.persist(TRANSACTIONS_JSON, next)?;
        Ok(id)
    }

    pub fn update_transaction(&mut self, transaction: Transaction) -> Result<(), Failure> {
        let ix = position(&self.transactions, |t| t.id == transaction.id)?;
        let mut next = self.transactions.clone();
        next[ix] = transaction;
        self.transactions = self.persist(TRANSACTIONS_JSON, next)?;
        Ok(())
    }

    pub fn delete_transaction(&mut self, id: i32) -> Result<(), Failure> {
        let ix = position(&self.transactions, |t| t.id == id)?;
        let mut next = self.transactions.clone();
        next.remove(ix);
        self.transactions = self.persist(TRANSACTIONS_JSON, next)?;
        Ok(())
    }

    pub fn add_budget(&mut self, budget: Budget) -> Result<(), Failure> {
        if self
            .budgets
            .iter()
            .any(|b| b.category_id == budget.category_id && b.month_year == budget.month_year)
        {
            return Err(Failure::Duplicate);
        }
        let mut next = self.budgets.clone();
        next.push(budget);
        self.budgets = self.persist(BUDGETS_JSON, next)?;
        Ok(())
    }

    pub fn update_budget(&mut self, budget: Budget) -> Result<(), Failure> {
        let ix = position(&self.budgets, |b| {
            b.category_id == budget.category_id && b.month_year == budget.month_year
        })?;
        let mut next = self.budgets.clone();
        next[ix] = budget;
        self.budgets = self.persist(BUDGETS_JSON, next)?;
        Ok(())
    }

    pub fn delete_budget(&mut self, category_id: i32, month_year: &str) -> Result<(), Failure> {
        let ix = position(&self.budgets, |b| {
            b.category_id == category_id && b.month_year == month_year
        })?;
        let mut next = self.budgets.clone();
        next.remove(ix);
        self.budgets = self.persist(BUDGETS_JSON, next)?;
        Ok(())
    }

    /// Transactions matching `filter`, each labeled with its category name.
    pub(crate) fn labeled_transactions(
        &self,
        filter: impl Fn(&Transaction) -> bool,
    ) -> Vec<Labeled<'_, Transaction>> {
        self.transactions
            .iter()
            .filter(|t| filter(t))
            .map(|t| Labeled {
                record: t,
                category_name: self.category_name(t.category_id),
            })
            .collect()
    }

    /// Budgets matching `filter`, each labeled with its category name.
    pub(crate) fn labeled_budgets(
        &self,
        filter: impl Fn(&Budget) -> bool,
    ) -> Vec<Labeled<'_, Budget>> {
        self.budgets
            .iter()
            .filter(|b| filter(b))
            .map(|b| Labeled {
                record: b,
                category_name: self.category_name(b.category_id),
            })
            .collect()
    }

    /// Sum of income (or expense) amounts for transactions dated in `month_year`.
    pub fn total(&self, month_year: &str, is_income: bool) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.is_income == is_income && t.date.starts_with(month_year))
            .map(|t| t.amount)
            .sum()
    }

    /// Signed month total per known category. Transactions of unknown categories are left out.
    pub fn category_totals(&self, month_year: &str) -> BTreeMap<i32, f64> {
        let mut totals: BTreeMap<i32, f64> =
            self.categories.iter().map(|c| (c.id, 0.0)).collect();
        for t in self.transactions.iter().filter(|t| t.date.starts_with(month_year)) {
            if let Some(total) = totals.get_mut(&t.category_id) {
                *total += if t.is_income { t.amount } else { -t.amount };
            }
        }
        totals
    }

    fn category_name(&self, id: i32) -> &str {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map_or(UNCATEGORIZED, |c| c.name.as_str())
    }

    /// Writes `items` as the whole document `file` and hands them back so the caller can commit
    /// them to memory only after the disk write succeeded.
    fn persist<T: Serialize>(&self, file: &str, items: Vec<T>) -> Result<Vec<T>, Failure> {
        let path = self.dir.join(file);
        match write_document(&path, &items) {
            Ok(()) => {
                debug!("Engine wrote {} records to {}", items.len(), path.display());
                Ok(items)
            }
            Err(e) => {
                warn!("Engine failed to write {}: {e}", path.display());
                Err(Failure::Persist)
            }
        }
    }
}

fn next_id(ids: impl Iterator<Item = i32>) -> Result<i32, Failure> {
    match ids.max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            warn!("Engine has no id left after {max}");
            Failure::Invalid
        }),
    }
}

fn position<T>(items: &[T], matches: impl Fn(&T) -> bool) -> Result<usize, Failure> {
    items.iter().position(matches).ok_or(Failure::NotFound)
}

fn load<T>(path: &Path) -> Vec<T>
where
    T: DeserializeOwned + Fields,
{
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Engine could not read {}: {e}", path.display());
            return Vec::new();
        }
    };
    decode(&text).unwrap_or_else(|e| {
        warn!("Engine could not parse {}: {e}", path.display());
        Vec::new()
    })
}

fn write_document<T: Serialize>(path: &Path, items: &[T]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}
