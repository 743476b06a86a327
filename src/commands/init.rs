use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the budget home directory, its data directory and an initial `config.json`. Running it
/// again on an existing home keeps the existing configuration.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub fn init(budget_home: &Path) -> Result<Out<()>> {
    let config = Config::create(budget_home)
        .context("Unable to create the budget home directory and config")?;
    Ok(format!(
        "Budget home is ready at {} with data in {}",
        config.root().display(),
        config.data_dir().display()
    )
    .into())
}
