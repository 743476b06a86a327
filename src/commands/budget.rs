//! Budget command handlers.

use crate::args::{BudgetArgs, BudgetKeyArgs, MonthArgs};
use crate::commands::{listing, money, plural, Out};
use crate::model::{Budget, BudgetKey, Labeled};
use crate::store::Storage;
use crate::Result;
use anyhow::Context;

fn budget(args: &BudgetArgs) -> Budget {
    Budget::new(args.key().category(), args.key().month(), args.amount())
}

fn key(args: &BudgetKeyArgs) -> BudgetKey {
    BudgetKey::new(args.category(), args.month())
}

/// # Errors
/// - Returns an error if the category already has a budget for that month or the write fails.
pub fn add_budget(store: &mut dyn Storage, args: &BudgetArgs) -> Result<Out<Budget>> {
    let budget = budget(args);
    store
        .add_budget(&budget)
        .with_context(|| format!("Unable to add a budget for {}", budget.key()))?;
    Ok(Out::new(format!("Added {budget}"), budget))
}

/// # Errors
/// - Returns an error if there is no budget for that category and month or the write fails.
pub fn update_budget(store: &mut dyn Storage, args: &BudgetArgs) -> Result<Out<Budget>> {
    let budget = budget(args);
    store
        .update_budget(&budget)
        .with_context(|| format!("Unable to update the budget for {}", budget.key()))?;
    Ok(Out::new(format!("Updated {budget}"), budget))
}

/// # Errors
/// - Returns an error if there is no budget for that category and month or the write fails.
pub fn delete_budget(store: &mut dyn Storage, args: &BudgetKeyArgs) -> Result<Out<()>> {
    let key = key(args);
    store
        .delete_budget(&key)
        .with_context(|| format!("Unable to delete the budget for {key}"))?;
    Ok(format!("Deleted the budget for {key}").into())
}

pub fn list_budgets(store: &dyn Storage, args: &MonthArgs) -> Result<Out<Vec<Labeled<Budget>>>> {
    let budgets = match args.month() {
        Some(month) => store.budgets_by_month(month),
        None => store.budgets(),
    };
    let heading = plural(budgets.len(), "budget", "budgets");
    let lines = budgets.iter().map(|b| {
        format!(
            "{} {} ({}) {:>12}",
            b.month_year,
            b.category_name(),
            b.category_id,
            money(b.allocated_amount)
        )
    });
    Ok(Out::new(listing(heading, lines), budgets))
}
