//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, LoggingConfig, MaPeriods, SessionSettings,
    StrategySettings,
};

use atlas_core::error::TradingError;
use config::{Config, Environment, File};
use std::path::Path;

/// Load configuration from file and `ATLAS__*` environment variables, then
/// validate it.
pub fn load_config(path: &Path) -> Result<AppConfig, TradingError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("ATLAS")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| TradingError::Configuration(e.to_string()))?;

    let app: AppConfig = config
        .try_deserialize()
        .map_err(|e| TradingError::Configuration(e.to_string()))?;
    app.validate()?;
    Ok(app)
}
