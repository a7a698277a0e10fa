//! Core types and traits for the strategy engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - Order, position and trade types
//! - Strategy intents and indicator state
//! - Collaborator traits for strategies, indicators, brokers and data providers

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    BrokerError, DataError, IndicatorError, OutOfOrderBarError, StrategyError, TradingError,
    TradingResult,
};
pub use traits::*;
pub use types::*;
