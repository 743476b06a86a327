//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands. Handlers other than `init` work
//! against an already opened `Storage`, so they behave the same whichever backend is active.

mod budget;
mod category;
mod init;
mod report;
mod transaction;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use budget::{add_budget, delete_budget, list_budgets, update_budget};
pub use category::{add_category, delete_category, list_categories, update_category};
pub use init::init;
pub use report::{report_month, report_trend, MonthReport};
pub use transaction::{add_transaction, delete_transaction, list_transactions, update_transaction};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Formats an amount with thousands separators and two decimals.
pub(crate) fn money(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    let value = amount.abs().round_dp(2).to_f64().unwrap_or_default();
    format!("{sign}{}", format_num::format_num!(",.2", value))
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

/// Joins a heading and one line per item into a message.
fn listing<I, D>(heading: String, items: I) -> String
where
    I: IntoIterator<Item = D>,
    D: std::fmt::Display,
{
    let mut message = heading;
    for item in items {
        message.push_str(&format!("\n  {item}"));
    }
    message
}
