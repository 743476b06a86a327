//! A personal finance tracker: categories, transactions and monthly budgets kept as JSON documents,
//! read and written through one `Storage` contract with two backends, plus monthly aggregates.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod report;
pub mod store;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, Result, StoreError};
