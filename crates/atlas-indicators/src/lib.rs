//! Streaming technical indicators over closed bars.
//!
//! This crate provides incremental implementations of:
//! - Moving averages (SMA, EMA)
//! - Average True Range (ATR)
//! - SuperTrend
//!
//! plus an [`IndicatorEngine`] that routes each closed bar of a symbol to
//! the indicators attached to its timeframe.

pub mod engine;
pub mod moving_average;
pub mod volatility;

pub use engine::IndicatorEngine;
pub use moving_average::{Ema, MaType, MovingAverage, Sma};
pub use volatility::{Atr, SuperTrend};
