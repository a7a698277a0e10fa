//! Market data handling: resampling, bar storage, session gating and CSV
//! replay.

mod bar_store;
mod csv_source;
mod resampler;
mod session;

pub use bar_store::BarStore;
pub use csv_source::{parse_timestamp, CsvDataProvider};
pub use resampler::Resampler;
pub use session::{SessionWindow, DEFAULT_SESSION_TZ};

use atlas_core::error::DataError;
use atlas_core::types::{Bar, Timeframe};
use std::path::Path;

/// Load every bar for `symbol` from a CSV file, in file order.
pub fn load_csv(
    path: impl AsRef<Path>,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<Vec<Bar>, DataError> {
    CsvDataProvider::new(path)?.load_all(symbol, timeframe)
}
