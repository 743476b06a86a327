//! Implements the `Storage` trait over three JSON documents in a data directory. Nothing is cached:
//! every call reads the documents it needs and every mutation rewrites one whole document.

use crate::error::StoreError;
use crate::model::{Budget, BudgetKey, Category, Labeled, Transaction, UNCATEGORIZED};
use crate::store::records::{self, Record};
use crate::store::{
    check_amount, next_id, BackendKind, Identified, Storage, StoreResult, BUDGETS_JSON,
    CATEGORIES_JSON, TRANSACTIONS_JSON,
};
use crate::{utils, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        utils::create_dir_all(&dir)?;
        debug!("Document store at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load<T: Record>(&self, file: &str) -> Vec<T> {
        let path = self.dir.join(file);
        let loaded = utils::read_optional(&path)
            .and_then(|text| text.map_or_else(|| Ok(Vec::new()), |text| records::decode(&text)));
        match loaded {
            Ok(items) => items,
            Err(e) => {
                warn!("Treating {} as empty: {e:#}", path.display());
                Vec::new()
            }
        }
    }

    fn save<T: Record>(&self, file: &str, items: &[T]) -> StoreResult<()> {
        let path = self.dir.join(file);
        records::encode(items)
            .and_then(|json| utils::write_atomic(&path, json))
            .map_err(|e| StoreError::persist(&e))?;
        debug!("Wrote {} records to {}", items.len(), path.display());
        Ok(())
    }

    fn add<T: Record + Identified + Clone>(&self, file: &str, item: &T) -> StoreResult<i32> {
        let mut items: Vec<T> = self.load(file);
        let mut item = item.clone();
        if item.id() <= 0 {
            item.set_id(next_id(&items)?);
        } else if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(StoreError::DuplicateId(item.id()));
        }
        let id = item.id();
        items.push(item);
        self.save(file, &items)?;
        Ok(id)
    }

    fn replace<T: Record + Clone>(
        &self,
        file: &str,
        item: &T,
        matches: impl Fn(&T) -> bool,
    ) -> StoreResult<()> {
        let mut items: Vec<T> = self.load(file);
        let ix = items
            .iter()
            .position(|existing| matches(existing))
            .ok_or(StoreError::NotFound)?;
        items[ix] = item.clone();
        self.save(file, &items)
    }

    fn remove<T: Record>(&self, file: &str, matches: impl Fn(&T) -> bool) -> StoreResult<()> {
        let mut items: Vec<T> = self.load(file);
        let ix = items
            .iter()
            .position(|existing| matches(existing))
            .ok_or(StoreError::NotFound)?;
        items.remove(ix);
        self.save(file, &items)
    }

    /// Attaches the current name of each record's category.
    fn label<T>(&self, items: Vec<T>, category_id: impl Fn(&T) -> i32) -> Vec<Labeled<T>> {
        let categories = self.categories();
        items
            .into_iter()
            .map(|item| {
                let name = Category::find_by_id(&categories, category_id(&item))
                    .map_or(UNCATEGORIZED, |c| c.name.as_str())
                    .to_string();
                Labeled::new(item, name)
            })
            .collect()
    }

    fn labeled_transactions(
        &self,
        keep: impl Fn(&Transaction) -> bool,
    ) -> Vec<Labeled<Transaction>> {
        let transactions: Vec<Transaction> = self
            .load::<Transaction>(TRANSACTIONS_JSON)
            .into_iter()
            .filter(|t| keep(t))
            .collect();
        self.label(transactions, |t| t.category_id)
    }

    fn labeled_budgets(&self, keep: impl Fn(&Budget) -> bool) -> Vec<Labeled<Budget>> {
        let budgets: Vec<Budget> = self
            .load::<Budget>(BUDGETS_JSON)
            .into_iter()
            .filter(|b| keep(b))
            .collect();
        self.label(budgets, |b| b.category_id)
    }
}

impl Storage for DocumentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn categories(&self) -> Vec<Category> {
        trace!("categories");
        self.load(CATEGORIES_JSON)
    }

    fn add_category(&mut self, category: &Category) -> StoreResult<i32> {
        trace!("add_category {category}");
        self.add(CATEGORIES_JSON, category)
    }

    fn update_category(&mut self, category: &Category) -> StoreResult<()> {
        trace!("update_category {category}");
        self.replace(CATEGORIES_JSON, category, |c: &Category| c.id == category.id)
    }

    fn delete_category(&mut self, id: i32) -> StoreResult<()> {
        trace!("delete_category {id}");
        self.remove(CATEGORIES_JSON, |c: &Category| c.id == id)
    }

    fn transactions(&self) -> Vec<Labeled<Transaction>> {
        trace!("transactions");
        self.labeled_transactions(|_| true)
    }

    fn transactions_by_month(&self, month_year: &str) -> Vec<Labeled<Transaction>> {
        trace!("transactions_by_month {month_year}");
        self.labeled_transactions(|t| t.in_month(month_year))
    }

    fn transactions_by_category(&self, category_id: i32) -> Vec<Labeled<Transaction>> {
        trace!("transactions_by_category {category_id}");
        self.labeled_transactions(|t| t.category_id == category_id)
    }

    fn add_transaction(&mut self, transaction: &Transaction) -> StoreResult<i32> {
        trace!("add_transaction {transaction}");
        check_amount("amount", transaction.amount)?;
        self.add(TRANSACTIONS_JSON, transaction)
    }

    fn update_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        trace!("update_transaction {transaction}");
        check_amount("amount", transaction.amount)?;
        self.replace(TRANSACTIONS_JSON, transaction, |t: &Transaction| {
            t.id == transaction.id
        })
    }

    fn delete_transaction(&mut self, id: i32) -> StoreResult<()> {
        trace!("delete_transaction {id}");
        self.remove(TRANSACTIONS_JSON, |t: &Transaction| t.id == id)
    }

    fn budgets(&self) -> Vec<Labeled<Budget>> {
        trace!("budgets");
        self.labeled_budgets(|_| true)
    }

    fn budgets_by_month(&self, month_year: &str) -> Vec<Labeled<Budget>> {
        trace!("budgets_by_month {month_year}");
        self.labeled_budgets(|b| b.month_year == month_year)
    }

    fn add_budget(&mut self, budget: &Budget) -> StoreResult<()> {
        trace!("add_budget {budget}");
        check_amount("allocated amount", budget.allocated_amount)?;
        let mut budgets: Vec<Budget> = self.load(BUDGETS_JSON);
        let key = budget.key();
        if budgets.iter().any(|b| b.has_key(&key)) {
            return Err(StoreError::DuplicateKey {
                category_id: key.category_id,
                month_year: key.month_year,
            });
        }
        budgets.push(budget.clone());
        self.save(BUDGETS_JSON, &budgets)
    }

    fn update_budget(&mut self, budget: &Budget) -> StoreResult<()> {
        trace!("update_budget {budget}");
        check_amount("allocated amount", budget.allocated_amount)?;
        let key = budget.key();
        self.replace(BUDGETS_JSON, budget, |b: &Budget| b.has_key(&key))
    }

    fn delete_budget(&mut self, key: &BudgetKey) -> StoreResult<()> {
        trace!("delete_budget {key}");
        self.remove(BUDGETS_JSON, |b: &Budget| b.has_key(key))
    }
}
