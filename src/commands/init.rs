use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the ledger home directory and an initial `config.json` with default settings.
///
/// # Errors
/// - Returns an error if any file operations fail or a config file already exists.
pub async fn init(ledger_home: &Path) -> Result<Out<()>> {
    let config = Config::create(ledger_home)
        .await
        .context("Unable to create the ledger home directory and config")?;
    Ok(format!(
        "Created {}. Put purchases in {} and expenses in {}",
        config.config_path().display(),
        config.purchases_path().display(),
        config.expenses_path().display()
    )
    .into())
}
