//! Run report generation.

use atlas_core::types::{Order, Position, Trade};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::ledger::{EquityPoint, LedgerSnapshot};
use crate::pipeline::SymbolPipeline;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every input bar was consumed
    Completed,
    /// A live run was stopped; working orders were cancelled
    Stopped,
    /// The run aborted; the ledger holds everything up to the failure
    Failed { error: String },
}

impl RunStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RunStatus::Failed { .. })
    }
}

/// Complete run report: summary metrics, trades, equity curve and orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub symbol: String,
    pub strategy: String,
    pub status: RunStatus,
    pub snapshot: LedgerSnapshot,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub orders: Vec<Order>,
    /// Position still open when the run ended
    pub open_position: Option<Position>,
    pub bars_processed: usize,
    pub bars_skipped: usize,
    pub rejections: usize,
}

impl RunReport {
    /// Collect the report of a pipeline.
    pub fn from_pipeline(pipeline: &SymbolPipeline, status: RunStatus) -> Self {
        let ledger = pipeline.ledger();
        Self {
            run_id: Uuid::new_v4(),
            symbol: pipeline.symbol().to_string(),
            strategy: pipeline.policy_name().to_string(),
            status,
            snapshot: ledger.snapshot(),
            trades: ledger.trades().to_vec(),
            equity_curve: ledger.equity_curve().to_vec(),
            orders: pipeline.orders().orders().to_vec(),
            open_position: pipeline.orders().position().cloned(),
            bars_processed: pipeline.bars_processed(),
            bars_skipped: pipeline.bars_skipped(),
            rejections: pipeline.rejections(),
        }
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let s = &self.snapshot;
        let rule = "───────────────────────────────────────────────────────────\n";
        let mut out = String::new();

        out.push_str("═══════════════════════════════════════════════════════════\n");
        out.push_str("                        RUN REPORT                         \n");
        out.push_str("═══════════════════════════════════════════════════════════\n\n");

        let _ = writeln!(out, "  Run:                 {}", self.run_id);
        let _ = writeln!(out, "  Symbol:              {}", self.symbol);
        let _ = writeln!(out, "  Strategy:            {}", self.strategy);
        let status = match &self.status {
            RunStatus::Completed => "completed".to_string(),
            RunStatus::Stopped => "stopped".to_string(),
            RunStatus::Failed { error } => format!("FAILED: {}", error),
        };
        let _ = writeln!(out, "  Status:              {}\n", status);

        out.push_str("PERFORMANCE\n");
        out.push_str(rule);
        let _ = writeln!(out, "  Starting Equity:     ${:.2}", s.starting_equity);
        let _ = writeln!(out, "  Final Equity:        ${:.2}", s.final_equity);
        let _ = writeln!(out, "  Total Return:        {:.2}%", s.total_return_pct);
        let _ = writeln!(out, "  Max Drawdown:        {:.2}%", s.max_drawdown_pct);
        let _ = writeln!(out, "  Net P&L:             ${:.2}", s.net_pnl);
        let _ = writeln!(out, "  Costs:               ${:.2}\n", s.total_costs);

        out.push_str("TRADE STATISTICS\n");
        out.push_str(rule);
        let _ = writeln!(out, "  Total Trades:        {}", s.trade_count);
        let _ = writeln!(out, "  Winning Trades:      {}", s.winning_trades);
        let _ = writeln!(out, "  Losing Trades:       {}", s.losing_trades);
        let _ = writeln!(out, "  Win Rate:            {:.2}%", s.win_rate_pct);
        let _ = writeln!(out, "  Avg Win:             ${:.2}", s.avg_win);
        let _ = writeln!(out, "  Avg Loss:            ${:.2}", s.avg_loss);
        match s.profit_factor {
            Some(pf) => {
                let _ = writeln!(out, "  Profit Factor:       {:.2}\n", pf);
            }
            None => out.push_str("  Profit Factor:       n/a\n\n"),
        }

        out.push_str("EXECUTION\n");
        out.push_str(rule);
        let _ = writeln!(out, "  Bars Processed:      {}", self.bars_processed);
        let _ = writeln!(out, "  Bars Skipped:        {}", self.bars_skipped);
        let _ = writeln!(out, "  Orders:              {}", self.orders.len());
        let _ = writeln!(out, "  Rejections:          {}", self.rejections);
        if let Some(p) = &self.open_position {
            let _ = writeln!(
                out,
                "  Open Position:       {} {} @ {}",
                p.side, p.quantity, p.entry_price
            );
        }
        out.push('\n');
        out.push_str("═══════════════════════════════════════════════════════════\n");
        out
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Trades as CSV, one row per round trip.
    pub fn trades_to_csv(&self) -> Result<String, csv::Error> {
        to_csv(&self.trades)
    }

    /// Equity curve as CSV.
    pub fn equity_to_csv(&self) -> Result<String, csv::Error> {
        to_csv(&self.equity_curve)
    }

    /// Write `report.json`, `summary.txt`, `trades.csv` and
    /// `equity_curve.csv` into `dir`.
    pub fn save(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let files = [
            ("report.json", self.to_json().map_err(io::Error::other)?),
            ("summary.txt", self.summary()),
            ("trades.csv", self.trades_to_csv().map_err(io::Error::other)?),
            ("equity_curve.csv", self.equity_to_csv().map_err(io::Error::other)?),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (name, body) in files {
            let path = dir.join(name);
            std::fs::write(&path, body)?;
            written.push(path);
        }
        Ok(written)
    }
}

fn to_csv<T: Serialize>(rows: &[T]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| csv::Error::from(io::Error::other(e)))
}
