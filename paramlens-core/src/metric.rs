//! Metric catalog — the fixed set of result metrics a user may correlate against.
//!
//! The catalog is static configuration, not derived from data. A record may
//! carry extra keys in its `results` map; only catalog metrics are selectable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::StrategyRecord;

/// Returned when a metric identifier is not part of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric '{0}' (valid: {valid})", valid = Metric::valid_ids())]
pub struct UnknownMetric(pub String);

/// A selectable performance metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Trades,
    AvgProfit,
    TotalProfitUsdt,
    #[default]
    TotalProfitPercent,
    Wins,
    Draws,
    Losses,
    WinRate,
    Drawdown,
}

impl Metric {
    /// Every catalog entry, in display order.
    pub const ALL: [Metric; 9] = [
        Metric::Trades,
        Metric::AvgProfit,
        Metric::TotalProfitUsdt,
        Metric::TotalProfitPercent,
        Metric::Wins,
        Metric::Draws,
        Metric::Losses,
        Metric::WinRate,
        Metric::Drawdown,
    ];

    /// Identifier used as the key in a record's `results` map.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::AvgProfit => "avg_profit",
            Self::TotalProfitUsdt => "total_profit_usdt",
            Self::TotalProfitPercent => "total_profit_percent",
            Self::Wins => "wins",
            Self::Draws => "draws",
            Self::Losses => "losses",
            Self::WinRate => "win_rate",
            Self::Drawdown => "drawdown",
        }
    }

    /// Human-readable label for selectors and table headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Trades => "Total Trades",
            Self::AvgProfit => "Average Profit %",
            Self::TotalProfitUsdt => "Total Profit (USDT)",
            Self::TotalProfitPercent => "Total Profit %",
            Self::Wins => "Wins",
            Self::Draws => "Draws",
            Self::Losses => "Losses",
            Self::WinRate => "Win Rate",
            Self::Drawdown => "Max Drawdown",
        }
    }

    /// Read this metric from a record. Missing values come back as NaN.
    pub fn extract(&self, record: &StrategyRecord) -> f64 {
        record.result(self.id())
    }

    fn valid_ids() -> String {
        Self::ALL.iter().map(|m| m.id()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.id() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}
