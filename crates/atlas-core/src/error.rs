//! Error types for the strategy engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Timeframe;

/// Top-level error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TradingError {
    /// Whether the error must abort the current run.
    ///
    /// Configuration and ordering errors are fatal; insufficient data,
    /// rejected orders and malformed bars are recovered locally.
    pub fn is_fatal(&self) -> bool {
        match self {
            TradingError::Configuration(_) => true,
            TradingError::Strategy(e) => matches!(e, StrategyError::InvalidConfig(_)),
            TradingError::Data(e) => e.is_fatal(),
            TradingError::Broker(_) | TradingError::Indicator(_) => false,
            TradingError::Io(_) | TradingError::Serialization(_) => true,
        }
    }
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Order placement and execution errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BrokerError {
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// A bar arrived with an open time not after the previous one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("out-of-order bar for {symbol} {timeframe}: {received} is not after {last}")]
pub struct OutOfOrderBarError {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub last: DateTime<Utc>,
    pub received: DateTime<Utc>,
}

/// Market data errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error(transparent)]
    OutOfOrder(#[from] OutOfOrderBarError),

    #[error("Malformed bar: {0}")]
    MalformedBar(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl DataError {
    /// Malformed bars are skipped; everything else ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DataError::MalformedBar(_))
    }
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for engine operations.
pub type TradingResult<T> = Result<T, TradingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fatality() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        let out_of_order: TradingError = DataError::from(OutOfOrderBarError {
            symbol: "QQQ".into(),
            timeframe: Timeframe::MINUTE_1,
            last: t,
            received: t,
        })
        .into();
        assert!(out_of_order.is_fatal());

        let malformed: TradingError = DataError::MalformedBar("high < low".into()).into();
        assert!(!malformed.is_fatal());

        let rejected: TradingError = BrokerError::OrderRejected("no cash".into()).into();
        assert!(!rejected.is_fatal());

        let insufficient: TradingError = IndicatorError::InsufficientData {
            required: 11,
            available: 3,
        }
        .into();
        assert!(!insufficient.is_fatal());

        assert!(TradingError::Configuration("missing symbol".into()).is_fatal());
    }

    #[test]
    fn test_out_of_order_message() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap();
        let err = OutOfOrderBarError {
            symbol: "QQQ".into(),
            timeframe: Timeframe::MINUTE_1,
            last: t,
            received: t,
        };
        assert!(err.to_string().contains("QQQ 1min"));
    }
}
