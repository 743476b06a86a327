//! Transaction command handlers.

use crate::args::{IdArgs, TransactionArgs, TransactionListArgs};
use crate::commands::{listing, money, plural, Out};
use crate::model::{Labeled, Transaction};
use crate::store::Storage;
use crate::Result;
use anyhow::Context;
use chrono::Local;

fn transaction(args: &TransactionArgs) -> Transaction {
    let date = args
        .date()
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());
    Transaction::new(
        date,
        args.amount(),
        args.description(),
        args.category(),
        args.income(),
    )
    .with_id(args.id())
}

fn line(t: &Labeled<Transaction>) -> String {
    format!(
        "#{} {} {:>12} {} ({}) {}",
        t.id,
        t.date,
        money(t.signed_amount()),
        t.category_name(),
        t.category_id,
        t.description
    )
}

/// Adds a transaction. A missing date is today's date.
///
/// # Errors
/// - Returns an error if a transaction with the requested id already exists or the write fails.
pub fn add_transaction(
    store: &mut dyn Storage,
    args: &TransactionArgs,
) -> Result<Out<Transaction>> {
    let transaction = transaction(args);
    let id = store
        .add_transaction(&transaction)
        .context("Unable to add the transaction")?;
    let transaction = transaction.with_id(id);
    Ok(Out::new(format!("Added {transaction}"), transaction))
}

/// Replaces the transaction with the id in `args`.
///
/// # Errors
/// - Returns an error if no such transaction exists or the write fails.
pub fn update_transaction(
    store: &mut dyn Storage,
    args: &TransactionArgs,
) -> Result<Out<Transaction>> {
    let transaction = transaction(args);
    store
        .update_transaction(&transaction)
        .with_context(|| format!("Unable to update transaction {}", transaction.id))?;
    Ok(Out::new(format!("Updated {transaction}"), transaction))
}

/// # Errors
/// - Returns an error if no such transaction exists or the write fails.
pub fn delete_transaction(store: &mut dyn Storage, args: &IdArgs) -> Result<Out<()>> {
    store
        .delete_transaction(args.id())
        .with_context(|| format!("Unable to delete transaction {}", args.id()))?;
    Ok(format!("Deleted transaction {}", args.id()).into())
}

/// Lists transactions, narrowed to a month and/or a category when those are given.
pub fn list_transactions(
    store: &dyn Storage,
    args: &TransactionListArgs,
) -> Result<Out<Vec<Labeled<Transaction>>>> {
    let mut transactions = match args.month() {
        Some(month) => store.transactions_by_month(month),
        None => match args.category() {
            Some(category_id) => store.transactions_by_category(category_id),
            None => store.transactions(),
        },
    };
    if let (Some(_), Some(category_id)) = (args.month(), args.category()) {
        transactions.retain(|t| t.category_id == category_id);
    }
    let heading = plural(transactions.len(), "transaction", "transactions");
    let message = listing(heading, transactions.iter().map(line));
    Ok(Out::new(message, transactions))
}
