//! Core traits for the strategy engine.

mod broker;
mod data_source;
mod indicator;
mod strategy;

pub use broker::{Broker, OrderAck};
pub use data_source::DataProvider;
pub use indicator::StreamingIndicator;
pub use strategy::{DecisionContext, Strategy, StrategyConfig};
