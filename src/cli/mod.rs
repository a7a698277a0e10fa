//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "atlas")]
#[command(author, version, about = "Multi-timeframe SuperTrend/MA strategy backtester and paper trader")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ATLAS_CONFIG", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level, overrides `logging.level`
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a backtest over a CSV of base bars
    Backtest(BacktestArgs),
    /// Replay a CSV as a live stream against the paper broker
    Paper(PaperArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Data file (CSV), overrides `backtest.data_file`
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Symbol, overrides `strategy.symbol`
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Strategy, overrides `strategy.strategy`
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// First bar to include (inclusive)
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Last bar to include (exclusive)
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Directory for report artifacts, overrides `backtest.output_dir`
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct PaperArgs {
    /// Data file (CSV) to replay, overrides `backtest.data_file`
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Symbols to run (comma-separated), defaults to `strategy.symbol`
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Strategy, overrides `strategy.strategy`
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Pause between replayed bars, overrides `backtest.replay_delay_ms`
    #[arg(long)]
    pub replay_delay_ms: Option<u64>,

    /// Directory for report artifacts, one subdirectory per symbol
    #[arg(long)]
    pub save: Option<PathBuf>,
}
