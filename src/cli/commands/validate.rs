//! Validate configuration command.

use anyhow::Result;
use atlas_config::AppConfig;
use atlas_core::error::TradingError;
use std::path::Path;

pub fn run(config_path: &Path, loaded: Result<AppConfig, TradingError>) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };
    let s = &config.strategy;

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Symbol: {}", s.symbol);
    println!("Strategy: {}", s.strategy);
    println!(
        "Timeframes: base {}, MA {}, trend {}",
        s.base_timeframe, s.ma_timeframe, s.trend_timeframe
    );
    println!(
        "SuperTrend: length {}, multiplier {}",
        s.supertrend_length, s.supertrend_multiplier
    );
    println!("Sizing: {:?}", s.sizing_method());
    if let Some(max) = s.max_shares {
        println!("Max shares: {}", max);
    }
    println!(
        "Brackets: {}",
        if s.use_bracket_orders {
            let b = s.bracket_levels();
            format!("stop {} / target {}", b.stop_loss_pct, b.take_profit_pct)
        } else {
            "disabled".to_string()
        }
    );
    if let Some(session) = s.session_window()? {
        println!("Session: {}", session);
    }
    Ok(())
}
