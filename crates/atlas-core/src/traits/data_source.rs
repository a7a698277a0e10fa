//! Data provider trait definition.

use crate::error::DataError;
use crate::types::{Bar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Source of bars for backtests (historical) and live runs (stream).
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch historical bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `timeframe` - The bar timeframe
    /// * `start` - Start of the range (inclusive)
    /// * `end` - End of the range (exclusive)
    ///
    /// # Returns
    /// Bars ordered from oldest to newest
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError>;

    /// Subscribe to bars as they close.
    ///
    /// The stream is lazy and cannot be restarted; it ends when the
    /// receiver yields `None`.
    async fn stream_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<mpsc::Receiver<Bar>, DataError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}
