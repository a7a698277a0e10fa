//! CSV data provider.

use async_trait::async_trait;
use atlas_core::error::DataError;
use atlas_core::traits::DataProvider;
use atlas_core::types::{Bar, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// CSV record format.
///
/// Prices are read as text so they convert to `Decimal` without a float
/// round trip.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "Timestamp",
        alias = "time",
        alias = "datetime"
    )]
    timestamp: String,
    #[serde(alias = "Symbol", alias = "ticker", default)]
    symbol: Option<String>,
    #[serde(alias = "Open")]
    open: String,
    #[serde(alias = "High")]
    high: String,
    #[serde(alias = "Low")]
    low: String,
    #[serde(alias = "Close", alias = "Adj Close")]
    close: String,
    #[serde(alias = "Volume", default)]
    volume: Option<String>,
}

/// Historical and replay data provider backed by one CSV file of base bars.
///
/// The file's row order is kept as is: bars that are out of order are
/// reported by the engine rather than silently sorted here.
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    path: PathBuf,
    replay_delay: Option<Duration>,
    channel_capacity: usize,
}

impl CsvDataProvider {
    /// Create a new CSV data provider.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::ConnectionError(format!(
                "CSV file not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            replay_delay: None,
            channel_capacity: 1024,
        })
    }

    /// Pause between bars when streaming.
    pub fn with_replay_delay(mut self, delay: Duration) -> Self {
        self.replay_delay = Some(delay);
        self
    }

    /// Buffer size of the streaming channel.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every bar for `symbol` in file order.
    ///
    /// Rows carrying a different symbol column are ignored; files without a
    /// symbol column are attributed to `symbol`.
    pub fn load_all(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut bars = Vec::new();

        for (line, result) in reader.deserialize().enumerate() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

            if let Some(row_symbol) = record.symbol.as_deref() {
                if !row_symbol.eq_ignore_ascii_case(symbol) {
                    continue;
                }
            }

            let row = line + 2;
            bars.push(Bar::new(
                symbol,
                timeframe,
                parse_timestamp(&record.timestamp)?,
                parse_price(&record.open, "open", row)?,
                parse_price(&record.high, "high", row)?,
                parse_price(&record.low, "low", row)?,
                parse_price(&record.close, "close", row)?,
                match record.volume.as_deref() {
                    Some(v) if !v.is_empty() => parse_price(v, "volume", row)?,
                    _ => Decimal::ZERO,
                },
            ));
        }

        debug!(
            path = %self.path.display(),
            symbol,
            count = bars.len(),
            "Loaded CSV bars"
        );
        Ok(bars)
    }
}

#[async_trait]
impl DataProvider for CsvDataProvider {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let bars: Vec<Bar> = self
            .load_all(symbol, timeframe)?
            .into_iter()
            .filter(|b| b.open_time >= start && b.open_time < end)
            .collect();

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(bars)
    }

    async fn stream_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<mpsc::Receiver<Bar>, DataError> {
        let bars = self.load_all(symbol, timeframe)?;
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let delay = self.replay_delay;
        let symbol = symbol.to_string();

        tokio::spawn(async move {
            let total = bars.len();
            for bar in bars {
                if tx.send(bar).await.is_err() {
                    debug!(symbol = %symbol, "Replay receiver dropped");
                    return;
                }
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
            }
            info!(symbol = %symbol, bars = total, "Replay finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

fn parse_price(value: &str, field: &str, row: usize) -> Result<Decimal, DataError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|e| DataError::ParseError(format!("row {}: invalid {} '{}': {}", row, field, value, e)))
}

/// Parse various timestamp formats into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }

    // Unix timestamp; milliseconds if > 10 digits
    if let Ok(ts) = value.parse::<i64>() {
        let parsed = if ts > 10_000_000_000 {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse timestamp: {}",
        value
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_csv(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("atlas-{}-{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-15 10:30").unwrap(), expected);
        assert_eq!(parse_timestamp("1705314600").unwrap(), expected);
        assert_eq!(parse_timestamp("1705314600000").unwrap(), expected);
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_load_keeps_file_order_and_filters_symbol() {
        let path = write_csv(
            "order",
            "timestamp,symbol,open,high,low,close,volume\n\
             2024-01-02 15:01:00,QQQ,100.1,100.2,100.0,100.15,500\n\
             2024-01-02 15:00:00,QQQ,100.0,100.3,99.9,100.1,400\n\
             2024-01-02 15:00:00,SPY,470,471,469,470.5,900\n",
        );
        let provider = CsvDataProvider::new(&path).unwrap();
        let bars = provider.load_all("QQQ", Timeframe::MINUTE_1).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bars.len(), 2);
        assert!(bars[0].open_time > bars[1].open_time);
        assert_eq!(bars[0].close, dec!(100.15));
        assert_eq!(bars[1].symbol, "QQQ");
    }

    #[test]
    fn test_bad_price_is_parse_error() {
        let path = write_csv(
            "bad",
            "timestamp,open,high,low,close\n2024-01-02 15:00:00,abc,1,1,1\n",
        );
        let provider = CsvDataProvider::new(&path).unwrap();
        let err = provider.load_all("QQQ", Timeframe::MINUTE_1).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, DataError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_historical_range_and_stream() {
        let path = write_csv(
            "stream",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-02 15:00:00,10,11,9,10.5,100\n\
             2024-01-02 15:01:00,10.5,11,10,10.8,100\n\
             2024-01-02 15:02:00,10.8,11.2,10.7,11,100\n",
        );
        let provider = CsvDataProvider::new(&path).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 2, 15, 1, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap();
        let bars = provider
            .get_historical_bars("QQQ", Timeframe::MINUTE_1, start, end)
            .await
            .unwrap();
        assert_eq!(bars.len(), 2);

        let mut rx = provider.stream_bars("QQQ", Timeframe::MINUTE_1).await.unwrap();
        let mut streamed = 0;
        while let Some(bar) = rx.recv().await {
            assert_eq!(bar.symbol, "QQQ");
            streamed += 1;
        }
        std::fs::remove_file(&path).ok();
        assert_eq!(streamed, 3);
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvDataProvider::new("/definitely/not/here.csv").is_err());
    }
}
