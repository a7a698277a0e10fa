//! CLI command implementations.

pub mod backtest;
pub mod paper;
pub mod strategies;
pub mod validate;

use anyhow::{Context, Result};
use atlas_config::AppConfig;
use std::path::PathBuf;

/// CSV path from the command line, falling back to the config file.
fn data_path(arg: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    let path = arg
        .or_else(|| config.backtest.data_file.clone())
        .context("No data file: pass --data or set backtest.data_file")?;
    if !path.is_file() {
        anyhow::bail!("Data file '{}' does not exist", path.display());
    }
    Ok(path)
}
