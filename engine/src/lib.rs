//! A native budget data engine with a C-callable surface.
//!
//! The engine is driven through an opaque handle obtained from [`bte_create`] and released with
//! [`bte_destroy`]. Mutations return either a positive id or one of the `STATUS_*` codes.
//! Collection reads return a UTF-8 JSON array that the caller must hand back to
//! [`bte_free_document`]; an empty collection is `[]`, never a null pointer. Month totals are
//! computed in the engine as well. Amounts that are not finite or exceed [`AMOUNT_LIMIT`] are
//! refused with [`STATUS_INVALID`].

mod manager;
mod record;

pub use manager::{Failure, Manager};
pub use record::{Budget, Category, Transaction, UNCATEGORIZED};

use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{error, trace, warn};

pub const STATUS_OK: c_int = 0;
pub const STATUS_DUPLICATE: c_int = -1;
pub const STATUS_NOT_FOUND: c_int = -2;
pub const STATUS_PERSIST: c_int = -3;
pub const STATUS_INVALID: c_int = -4;

/// The document returned for an empty collection.
pub const EMPTY_DOCUMENT: &str = "[]";

/// Amounts must be finite and smaller than this in magnitude.
pub const AMOUNT_LIMIT: f64 = 1e28;

/// True when `amount` can be stored and read back as the same number.
pub fn amount_in_range(amount: f64) -> bool {
    amount.is_finite() && amount.abs() < AMOUNT_LIMIT
}

/// Managers that have been created and not yet destroyed, keyed by handle. Handles are tokens
/// that are never reused, so a stale handle can never reach a newer manager.
static LIVE: Mutex<BTreeMap<usize, Manager>> = Mutex::new(BTreeMap::new());
static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(1);

/// Runs `f` against the manager behind `handle` if the handle is live.
fn with_manager<R>(handle: *mut c_void, f: impl FnOnce(&mut Manager) -> R) -> Option<R> {
    let mut live = LIVE.lock().unwrap_or_else(PoisonError::into_inner);
    match live.get_mut(&(handle as usize)) {
        Some(manager) => Some(f(manager)),
        None => {
            warn!("Engine call with an unknown or released handle");
            None
        }
    }
}

/// Borrows a C string as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the returned borrow.
unsafe fn text<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: upheld by the caller.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn status(result: Result<(), Failure>) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(failure) => failure_code(failure),
    }
}

fn id_or_status(result: Result<i32, Failure>) -> c_int {
    result.unwrap_or_else(failure_code)
}

fn failure_code(failure: Failure) -> c_int {
    match failure {
        Failure::Duplicate => STATUS_DUPLICATE,
        Failure::NotFound => STATUS_NOT_FOUND,
        Failure::Persist => STATUS_PERSIST,
        Failure::Invalid => STATUS_INVALID,
    }
}

fn document<T: Serialize>(items: &[T]) -> *mut c_char {
    match serde_json::to_string(items) {
        Ok(json) => into_raw(json),
        Err(e) => {
            error!("Engine could not encode a document: {e}");
            empty_document()
        }
    }
}

fn empty_document() -> *mut c_char {
    into_raw(EMPTY_DOCUMENT.to_string())
}

fn into_raw(json: String) -> *mut c_char {
    // Encoded JSON escapes NUL, so this only fails on a bug in the encoder.
    CString::new(json)
        .or_else(|_| CString::new(EMPTY_DOCUMENT))
        .map_or(ptr::null_mut(), CString::into_raw)
}

/// Creates an engine over `data_dir`. Returns null when the path is unusable.
///
/// # Safety
/// `data_dir` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_create(data_dir: *const c_char) -> *mut c_void {
    // SAFETY: forwarded from the caller.
    let Some(dir) = (unsafe { text(data_dir) }) else {
        error!("Engine requires a UTF-8 data directory");
        return ptr::null_mut();
    };
    match Manager::open(dir) {
        Ok(manager) => {
            let token = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
            LIVE.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(token, manager);
            trace!("Engine created handle {token} for {dir}");
            token as *mut c_void
        }
        Err(e) => {
            error!("Engine could not open {dir}: {e}");
            ptr::null_mut()
        }
    }
}

/// Destroys an engine. Null, unknown and already destroyed handles are ignored.
///
/// # Safety
/// Always safe to call; the signature is `unsafe` to match the rest of the surface.
#[no_mangle]
pub unsafe extern "C" fn bte_destroy(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    let removed = LIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&(handle as usize));
    match removed {
        Some(_) => trace!("Engine destroyed handle {}", handle as usize),
        None => warn!("Attempt to destroy an already destroyed or invalid engine handle"),
    }
}

/// Releases a document returned by one of the `bte_get_*` functions.
///
/// # Safety
/// `document` must be null or a pointer returned by this engine that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn bte_free_document(document: *mut c_char) {
    if !document.is_null() {
        // SAFETY: upheld by the caller; the pointer came from `CString::into_raw`.
        drop(unsafe { CString::from_raw(document) });
    }
}

/// # Safety
/// String arguments must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn bte_add_category(
    handle: *mut c_void,
    id: c_int,
    name: *const c_char,
    description: *const c_char,
    color: *const c_char,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(category) = (unsafe { category(id, name, description, color) }) else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| id_or_status(m.add_category(category))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// String arguments must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn bte_update_category(
    handle: *mut c_void,
    id: c_int,
    name: *const c_char,
    description: *const c_char,
    color: *const c_char,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(category) = (unsafe { category(id, name, description, color) }) else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| status(m.update_category(category))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `handle` must be null or a value returned by [`bte_create`].
#[no_mangle]
pub unsafe extern "C" fn bte_delete_category(handle: *mut c_void, id: c_int) -> c_int {
    with_manager(handle, |m| status(m.delete_category(id))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `handle` must be null or a value returned by [`bte_create`].
#[no_mangle]
pub unsafe extern "C" fn bte_get_categories(handle: *mut c_void) -> *mut c_char {
    with_manager(handle, |m| document(m.categories())).unwrap_or_else(empty_document)
}

/// # Safety
/// String arguments must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn bte_add_transaction(
    handle: *mut c_void,
    id: c_int,
    date: *const c_char,
    amount: f64,
    description: *const c_char,
    category_id: c_int,
    is_income: bool,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(transaction) =
        (unsafe { transaction(id, date, amount, description, category_id, is_income) })
    else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| id_or_status(m.add_transaction(transaction)))
        .unwrap_or(STATUS_INVALID)
}

/// # Safety
/// String arguments must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn bte_update_transaction(
    handle: *mut c_void,
    id: c_int,
    date: *const c_char,
    amount: f64,
    description: *const c_char,
    category_id: c_int,
    is_income: bool,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(transaction) =
        (unsafe { transaction(id, date, amount, description, category_id, is_income) })
    else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| status(m.update_transaction(transaction))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `handle` must be null or a value returned by [`bte_create`].
#[no_mangle]
pub unsafe extern "C" fn bte_delete_transaction(handle: *mut c_void, id: c_int) -> c_int {
    with_manager(handle, |m| status(m.delete_transaction(id))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `handle` must be null or a value returned by [`bte_create`].
#[no_mangle]
pub unsafe extern "C" fn bte_get_transactions(handle: *mut c_void) -> *mut c_char {
    with_manager(handle, |m| document(&m.labeled_transactions(|_| true)))
        .unwrap_or_else(empty_document)
}

/// Transactions whose date starts with `month_year`.
///
/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_get_transactions_by_month(
    handle: *mut c_void,
    month_year: *const c_char,
) -> *mut c_char {
    // SAFETY: forwarded from the caller.
    let Some(month_year) = (unsafe { text(month_year) }) else {
        return empty_document();
    };
    with_manager(handle, |m| {
        document(&m.labeled_transactions(|t| t.date.starts_with(month_year)))
    })
    .unwrap_or_else(empty_document)
}

/// # Safety
/// `handle` must be null or a value returned by [`bte_create`].
#[no_mangle]
pub unsafe extern "C" fn bte_get_transactions_by_category(
    handle: *mut c_void,
    category_id: c_int,
) -> *mut c_char {
    with_manager(handle, |m| {
        document(&m.labeled_transactions(|t| t.category_id == category_id))
    })
    .unwrap_or_else(empty_document)
}

/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_add_budget(
    handle: *mut c_void,
    category_id: c_int,
    month_year: *const c_char,
    allocated_amount: f64,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(budget) = (unsafe { budget(category_id, month_year, allocated_amount) }) else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| status(m.add_budget(budget))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_update_budget(
    handle: *mut c_void,
    category_id: c_int,
    month_year: *const c_char,
    allocated_amount: f64,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(budget) = (unsafe { budget(category_id, month_year, allocated_amount) }) else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| status(m.update_budget(budget))).unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_delete_budget(
    handle: *mut c_void,
    category_id: c_int,
    month_year: *const c_char,
) -> c_int {
    // SAFETY: forwarded from the caller.
    let Some(month_year) = (unsafe { text(month_year) }) else {
        return STATUS_INVALID;
    };
    with_manager(handle, |m| status(m.delete_budget(category_id, month_year)))
        .unwrap_or(STATUS_INVALID)
}

/// # Safety
/// `handle` must be null or a value returned by [`bte_create`].
#[no_mangle]
pub unsafe extern "C" fn bte_get_budgets(handle: *mut c_void) -> *mut c_char {
    with_manager(handle, |m| document(&m.labeled_budgets(|_| true))).unwrap_or_else(empty_document)
}

/// Budgets whose month equals `month_year`.
///
/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_get_budgets_by_month(
    handle: *mut c_void,
    month_year: *const c_char,
) -> *mut c_char {
    // SAFETY: forwarded from the caller.
    let Some(month_year) = (unsafe { text(month_year) }) else {
        return empty_document();
    };
    with_manager(handle, |m| {
        document(&m.labeled_budgets(|b| b.month_year == month_year))
    })
    .unwrap_or_else(empty_document)
}

/// Sum of income amounts for transactions dated in `month_year`. Unknown handles and a null month
/// give `0.0`.
///
/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_get_total_income(
    handle: *mut c_void,
    month_year: *const c_char,
) -> f64 {
    // SAFETY: forwarded from the caller.
    unsafe { total(handle, month_year, true) }
}

/// Sum of expense amounts for transactions dated in `month_year`. Unknown handles and a null month
/// give `0.0`.
///
/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_get_total_expense(
    handle: *mut c_void,
    month_year: *const c_char,
) -> f64 {
    // SAFETY: forwarded from the caller.
    unsafe { total(handle, month_year, false) }
}

/// A JSON object from category id to the signed total of its `month_year` transactions, with an
/// entry for every known category. Freed with [`bte_free_document`].
///
/// # Safety
/// `month_year` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bte_get_category_totals(
    handle: *mut c_void,
    month_year: *const c_char,
) -> *mut c_char {
    // SAFETY: forwarded from the caller.
    let Some(month_year) = (unsafe { text(month_year) }) else {
        return into_raw(EMPTY_TOTALS.to_string());
    };
    with_manager(handle, |m| match serde_json::to_string(&m.category_totals(month_year)) {
        Ok(json) => into_raw(json),
        Err(e) => {
            error!("Engine could not encode category totals: {e}");
            into_raw(EMPTY_TOTALS.to_string())
        }
    })
    .unwrap_or_else(|| into_raw(EMPTY_TOTALS.to_string()))
}

const EMPTY_TOTALS: &str = "{}";

unsafe fn total(handle: *mut c_void, month_year: *const c_char, is_income: bool) -> f64 {
    // SAFETY: forwarded from the caller.
    let Some(month_year) = (unsafe { text(month_year) }) else {
        return 0.0;
    };
    with_manager(handle, |m| m.total(month_year, is_income)).unwrap_or(0.0)
}

unsafe fn category(
    id: c_int,
    name: *const c_char,
    description: *const c_char,
    color: *const c_char,
) -> Option<Category> {
    // SAFETY: forwarded from the caller.
    unsafe {
        Some(Category {
            id,
            name: text(name)?.to_string(),
            description: text(description)?.to_string(),
            color: text(color)?.to_string(),
        })
    }
}

unsafe fn transaction(
    id: c_int,
    date: *const c_char,
    amount: f64,
    description: *const c_char,
    category_id: c_int,
    is_income: bool,
) -> Option<Transaction> {
    if !amount_in_range(amount) {
        warn!("Engine refused the transaction amount {amount}");
        return None;
    }
    // SAFETY: forwarded from the caller.
    unsafe {
        Some(Transaction {
            id,
            date: text(date)?.to_string(),
            amount,
            description: text(description)?.to_string(),
            category_id,
            is_income,
        })
    }
}

unsafe fn budget(
    category_id: c_int,
    month_year: *const c_char,
    allocated_amount: f64,
) -> Option<Budget> {
    if !amount_in_range(allocated_amount) {
        warn!("Engine refused the allocated amount {allocated_amount}");
        return None;
    }
    // SAFETY: forwarded from the caller.
    let month_year = unsafe { text(month_year) }?;
    Some(Budget {
        category_id,
        month_year: month_year.to_string(),
        allocated_amount,
    })
}
