//! Implements the `Storage` trait by delegating to the native engine through its C surface.
//!
//! The adapter holds one opaque engine handle. Strings cross the boundary as NUL-terminated UTF-8,
//! collections come back as JSON documents that are copied out and handed straight back to the
//! engine to free.

use crate::error::StoreError;
use crate::model::{Budget, BudgetKey, Category, Labeled, Transaction};
use crate::store::records::{self, Record};
use crate::store::{check_amount, BackendKind, Storage, StoreResult};
use crate::Result;
use anyhow::{bail, Context};
use budget_engine::{STATUS_DUPLICATE, STATUS_INVALID, STATUS_NOT_FOUND, STATUS_PERSIST};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::Path;
use std::ptr;
use tracing::{debug, trace, warn};

type Handle = *mut c_void;
type Document = *mut c_char;
type Text = *const c_char;

/// The engine's exported functions. [`EngineApi::linked`] gives the engine built with this crate;
/// any other table must follow the same contract.
#[derive(Debug, Clone, Copy)]
pub struct EngineApi {
    pub create: unsafe extern "C" fn(Text) -> Handle,
    pub destroy: unsafe extern "C" fn(Handle),
    pub free_document: unsafe extern "C" fn(Document),
    pub add_category: unsafe extern "C" fn(Handle, c_int, Text, Text, Text) -> c_int,
    pub update_category: unsafe extern "C" fn(Handle, c_int, Text, Text, Text) -> c_int,
    pub delete_category: unsafe extern "C" fn(Handle, c_int) -> c_int,
    pub get_categories: unsafe extern "C" fn(Handle) -> Document,
    pub add_transaction: unsafe extern "C" fn(Handle, c_int, Text, f64, Text, c_int, bool) -> c_int,
    pub update_transaction:
        unsafe extern "C" fn(Handle, c_int, Text, f64, Text, c_int, bool) -> c_int,
    pub delete_transaction: unsafe extern "C" fn(Handle, c_int) -> c_int,
    pub get_transactions: unsafe extern "C" fn(Handle) -> Document,
    pub get_transactions_by_month: unsafe extern "C" fn(Handle, Text) -> Document,
    pub get_transactions_by_category: unsafe extern "C" fn(Handle, c_int) -> Document,
    pub add_budget: unsafe extern "C" fn(Handle, c_int, Text, f64) -> c_int,
    pub update_budget: unsafe extern "C" fn(Handle, c_int, Text, f64) -> c_int,
    pub delete_budget: unsafe extern "C" fn(Handle, c_int, Text) -> c_int,
    pub get_budgets: unsafe extern "C" fn(Handle) -> Document,
    pub get_budgets_by_month: unsafe extern "C" fn(Handle, Text) -> Document,
    pub get_total_income: unsafe extern "C" fn(Handle, Text) -> f64,
    pub get_total_expense: unsafe extern "C" fn(Handle, Text) -> f64,
    pub get_category_totals: unsafe extern "C" fn(Handle, Text) -> Document,
}

impl EngineApi {
    pub fn linked() -> Self {
        use budget_engine as e;
        Self {
            create: e::bte_create,
            destroy: e::bte_destroy,
            free_document: e::bte_free_document,
            add_category: e::bte_add_category,
            update_category: e::bte_update_category,
            delete_category: e::bte_delete_category,
            get_categories: e::bte_get_categories,
            add_transaction: e::bte_add_transaction,
            update_transaction: e::bte_update_transaction,
            delete_transaction: e::bte_delete_transaction,
            get_transactions: e::bte_get_transactions,
            get_transactions_by_month: e::bte_get_transactions_by_month,
            get_transactions_by_category: e::bte_get_transactions_by_category,
            add_budget: e::bte_add_budget,
            update_budget: e::bte_update_budget,
            delete_budget: e::bte_delete_budget,
            get_budgets: e::bte_get_budgets,
            get_budgets_by_month: e::bte_get_budgets_by_month,
            get_total_income: e::bte_get_total_income,
            get_total_expense: e::bte_get_total_expense,
            get_category_totals: e::bte_get_category_totals,
        }
    }
}

/// Whether an `EngineStore` destroys its handle when released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The handle was created by this store and is destroyed by it.
    Owned,
    /// The handle belongs to someone else and is left alone.
    Borrowed,
}

pub struct EngineStore {
    api: EngineApi,
    handle: Handle,
    ownership: Ownership,
}

impl EngineStore {
    /// Creates an engine over `dir` and checks that it answers. The handle is destroyed again if
    /// the check fails.
    pub fn open(api: EngineApi, dir: &Path) -> Result<Self> {
        let dir_str = dir
            .to_str()
            .with_context(|| format!("The data path {} is not valid UTF-8", dir.display()))?;
        let c_dir = CString::new(dir_str)
            .with_context(|| format!("The data path {dir_str} contains a NUL character"))?;
        // SAFETY: `c_dir` is a valid NUL-terminated string for the duration of the call.
        let handle = unsafe { (api.create)(c_dir.as_ptr()) };
        if handle.is_null() {
            bail!("The engine could not be created for {dir_str}");
        }
        let store = Self {
            api,
            handle,
            ownership: Ownership::Owned,
        };
        let probe = store
            .document("probe", |h| unsafe { (api.get_categories)(h) })
            .context("The engine did not answer")?;
        records::decode::<Category>(&probe).context("The engine answered with a bad document")?;
        debug!("Engine store at {dir_str}");
        Ok(store)
    }

    /// Wraps a handle that is owned elsewhere. Releasing this store never destroys it.
    ///
    /// # Safety
    /// `handle` must have been returned by `api.create` and must stay live for as long as this
    /// store makes calls with it.
    pub unsafe fn borrowed(api: EngineApi, handle: *mut c_void) -> Self {
        Self {
            api,
            handle,
            ownership: Ownership::Borrowed,
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_null()
    }

    /// Gives up the handle, destroying it if it is owned. Later calls are refused. Releasing twice
    /// does nothing.
    pub fn release(&mut self) {
        if self.handle.is_null() {
            return;
        }
        if self.ownership == Ownership::Owned {
            // SAFETY: the handle came from `api.create` and has not been destroyed.
            unsafe { (self.api.destroy)(self.handle) };
            debug!("Released engine handle");
        }
        self.handle = ptr::null_mut();
    }

    /// Income (or expense) for `month_year` as the engine itself totals it.
    pub fn engine_total(&self, month_year: &str, is_income: bool) -> Result<Decimal> {
        if self.handle.is_null() {
            bail!("engine_total after the engine handle was released");
        }
        let month = CString::new(month_year)
            .with_context(|| format!("Month {month_year:?} contains a NUL character"))?;
        let call = if is_income {
            self.api.get_total_income
        } else {
            self.api.get_total_expense
        };
        // SAFETY: the handle is live and `month` outlives the call.
        let total = unsafe { call(self.handle, month.as_ptr()) };
        Decimal::from_f64(total)
            .with_context(|| format!("The engine returned the total {total} for {month_year}"))
    }

    /// Signed totals per known category for `month_year` as the engine itself computes them.
    pub fn engine_category_totals(&self, month_year: &str) -> Result<BTreeMap<i32, Decimal>> {
        let month = CString::new(month_year)
            .with_context(|| format!("Month {month_year:?} contains a NUL character"))?;
        let text = self.document("engine_category_totals", |h| unsafe {
            (self.api.get_category_totals)(h, month.as_ptr())
        })?;
        serde_json::from_str(&text).context("The engine answered with bad category totals")
    }

    /// Makes a call that returns a document and copies the document out. A null document is an
    /// empty collection.
    fn document(&self, what: &str, call: impl FnOnce(Handle) -> Document) -> Result<String> {
        if self.handle.is_null() {
            bail!("{what} after the engine handle was released");
        }
        let raw = call(self.handle);
        if raw.is_null() {
            return Ok(budget_engine::EMPTY_DOCUMENT.to_string());
        }
        // SAFETY: a non-null document is a NUL-terminated string owned by the engine until freed.
        let text = unsafe { CStr::from_ptr(raw) }.to_str().map(str::to_string);
        // SAFETY: `raw` came from the engine and is freed exactly once.
        unsafe { (self.api.free_document)(raw) };
        text.with_context(|| format!("{what} returned a document that is not UTF-8"))
    }

    fn read<T: Record>(&self, what: &str, call: impl FnOnce(Handle) -> Document) -> Vec<T> {
        trace!("{what}");
        match self
            .document(what, call)
            .and_then(|text| records::decode(&text))
        {
            Ok(items) => items,
            Err(e) => {
                warn!("Treating {what} as empty: {e:#}");
                Vec::new()
            }
        }
    }

    fn read_labeled<T: Record>(
        &self,
        what: &str,
        call: impl FnOnce(Handle) -> Document,
    ) -> Vec<Labeled<T>> {
        trace!("{what}");
        match self
            .document(what, call)
            .and_then(|text| records::decode_labeled(&text))
        {
            Ok(items) => items,
            Err(e) => {
                warn!("Treating {what} as empty: {e:#}");
                Vec::new()
            }
        }
    }

    /// Makes a mutating call and turns its status into a result. `duplicate` names the record that
    /// a duplicate status refers to.
    fn mutate(
        &self,
        what: &str,
        duplicate: impl FnOnce() -> StoreError,
        call: impl FnOnce(Handle) -> c_int,
    ) -> StoreResult<c_int> {
        trace!("{what}");
        if self.handle.is_null() {
            warn!("{what} after the engine handle was released");
            return Err(StoreError::Released);
        }
        match call(self.handle) {
            code if code >= 0 => Ok(code),
            STATUS_DUPLICATE => Err(duplicate()),
            STATUS_NOT_FOUND => Err(StoreError::NotFound),
            STATUS_PERSIST => Err(StoreError::Persist(format!(
                "the engine could not write during {what}"
            ))),
            STATUS_INVALID => Err(StoreError::InvalidArgument(format!(
                "the engine refused the arguments to {what}"
            ))),
            code => Err(StoreError::Persist(format!(
                "unexpected status {code} from {what}"
            ))),
        }
    }
}

impl Drop for EngineStore {
    fn drop(&mut self) {
        self.release();
    }
}

fn c_text(field: &str, value: &str) -> StoreResult<CString> {
    CString::new(value)
        .map_err(|_| StoreError::InvalidArgument(format!("{field} contains a NUL character")))
}

fn c_amount(field: &str, amount: Decimal) -> StoreResult<f64> {
    check_amount(field, amount)?;
    amount
        .to_f64()
        .ok_or_else(|| StoreError::InvalidArgument(format!("{field} {amount} is out of range")))
}

fn duplicate_id(id: i32) -> impl FnOnce() -> StoreError {
    move || StoreError::DuplicateId(id)
}

fn duplicate_key(category_id: i32, month_year: &str) -> impl FnOnce() -> StoreError {
    let month_year = month_year.to_string();
    move || StoreError::DuplicateKey {
        category_id,
        month_year,
    }
}

// SAFETY (for every call below): the handle passed to the closure is live, since `document` and
// `mutate` only invoke the closure with a non-null handle, and every string argument is a
// `CString` that outlives the call.
impl Storage for EngineStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Engine
    }

    fn categories(&self) -> Vec<Category> {
        self.read("categories", |h| unsafe { (self.api.get_categories)(h) })
    }

    fn add_category(&mut self, category: &Category) -> StoreResult<i32> {
        let name = c_text("name", &category.name)?;
        let description = c_text("description", &category.description)?;
        let color = c_text("color", &category.color)?;
        self.mutate("add_category", duplicate_id(category.id), |h| unsafe {
            (self.api.add_category)(
                h,
                category.id,
                name.as_ptr(),
                description.as_ptr(),
                color.as_ptr(),
            )
        })
    }

    fn update_category(&mut self, category: &Category) -> StoreResult<()> {
        let name = c_text("name", &category.name)?;
        let description = c_text("description", &category.description)?;
        let color = c_text("color", &category.color)?;
        self.mutate("update_category", duplicate_id(category.id), |h| unsafe {
            (self.api.update_category)(
                h,
                category.id,
                name.as_ptr(),
                description.as_ptr(),
                color.as_ptr(),
            )
        })
        .map(drop)
    }

    fn delete_category(&mut self, id: i32) -> StoreResult<()> {
        self.mutate("delete_category", duplicate_id(id), |h| unsafe {
            (self.api.delete_category)(h, id)
        })
        .map(drop)
    }

    fn transactions(&self) -> Vec<Labeled<Transaction>> {
        self.read_labeled("transactions", |h| unsafe {
            (self.api.get_transactions)(h)
        })
    }

    fn transactions_by_month(&self, month_year: &str) -> Vec<Labeled<Transaction>> {
        let Ok(month) = c_text("month", month_year) else {
            warn!("Month {month_year:?} cannot be passed to the engine");
            return Vec::new();
        };
        self.read_labeled("transactions_by_month", |h| unsafe {
            (self.api.get_transactions_by_month)(h, month.as_ptr())
        })
    }

    fn transactions_by_category(&self, category_id: i32) -> Vec<Labeled<Transaction>> {
        self.read_labeled("transactions_by_category", |h| unsafe {
            (self.api.get_transactions_by_category)(h, category_id)
        })
    }

    fn add_transaction(&mut self, transaction: &Transaction) -> StoreResult<i32> {
        let date = c_text("date", &transaction.date)?;
        let amount = c_amount("amount", transaction.amount)?;
        let description = c_text("description", &transaction.description)?;
        self.mutate("add_transaction", duplicate_id(transaction.id), |h| unsafe {
            (self.api.add_transaction)(
                h,
                transaction.id,
                date.as_ptr(),
                amount,
                description.as_ptr(),
                transaction.category_id,
                transaction.is_income,
            )
        })
    }

    fn update_transaction(&mut self, transaction: &Transaction) -> StoreResult<()> {
        let date = c_text("date", &transaction.date)?;
        let amount = c_amount("amount", transaction.amount)?;
        let description = c_text("description", &transaction.description)?;
        self.mutate("update_transaction", duplicate_id(transaction.id), |h| unsafe {
            (self.api.update_transaction)(
                h,
                transaction.id,
                date.as_ptr(),
                amount,
                description.as_ptr(),
                transaction.category_id,
                transaction.is_income,
            )
        })
        .map(drop)
    }

    fn delete_transaction(&mut self, id: i32) -> StoreResult<()> {
        self.mutate("delete_transaction", duplicate_id(id), |h| unsafe {
            (self.api.delete_transaction)(h, id)
        })
        .map(drop)
    }

    fn budgets(&self) -> Vec<Labeled<Budget>> {
        self.read_labeled("budgets", |h| unsafe { (self.api.get_budgets)(h) })
    }

    fn budgets_by_month(&self, month_year: &str) -> Vec<Labeled<Budget>> {
        let Ok(month) = c_text("month", month_year) else {
            warn!("Month {month_year:?} cannot be passed to the engine");
            return Vec::new();
        };
        self.read_labeled("budgets_by_month", |h| unsafe {
            (self.api.get_budgets_by_month)(h, month.as_ptr())
        })
    }

    fn add_budget(&mut self, budget: &Budget) -> StoreResult<()> {
        let month = c_text("month", &budget.month_year)?;
        let amount = c_amount("allocated amount", budget.allocated_amount)?;
        let duplicate = duplicate_key(budget.category_id, &budget.month_year);
        self.mutate("add_budget", duplicate, |h| unsafe {
            (self.api.add_budget)(h, budget.category_id, month.as_ptr(), amount)
        })
        .map(drop)
    }

    fn update_budget(&mut self, budget: &Budget) -> StoreResult<()> {
        let month = c_text("month", &budget.month_year)?;
        let amount = c_amount("allocated amount", budget.allocated_amount)?;
        let duplicate = duplicate_key(budget.category_id, &budget.month_year);
        self.mutate("update_budget", duplicate, |h| unsafe {
            (self.api.update_budget)(h, budget.category_id, month.as_ptr(), amount)
        })
        .map(drop)
    }

    fn delete_budget(&mut self, key: &BudgetKey) -> StoreResult<()> {
        let month = c_text("month", &key.month_year)?;
        let duplicate = duplicate_key(key.category_id, &key.month_year);
        self.mutate("delete_budget", duplicate, |h| unsafe {
            (self.api.delete_budget)(h, key.category_id, month.as_ptr())
        })
        .map(drop)
    }
}
