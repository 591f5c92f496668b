use crate::breakdown::{DailyPnl, GroupAttribute, GroupStats};
use crate::curve::{DrawdownPoint, EquityPoint};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary statistics over a filtered set of trades.
///
/// Ratios that have no meaning for the data at hand (no decisive trades, no
/// losses, too few samples) are `None` rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Core Profitability Metrics
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Option<Decimal>, // None when there are no losses
    /// Average PnL per trade.
    pub expectancy: Option<Decimal>,
    /// Average R-multiple over the trades that have one.
    pub expectancy_r: Option<Decimal>,

    // II. Risk and Drawdown
    pub max_drawdown: Decimal,
    /// Max drawdown as a percentage of the highest equity peak. None until the curve has been above zero.
    pub max_drawdown_pct: Option<Decimal>,
    pub sharpe_ratio: Option<Decimal>, // None below two trades or with no deviation

    // III. Trade-Level Statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: Option<Decimal>, // fraction of decisive trades, None when there are none
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,

    // IV. Time-Based Metrics
    #[serde(with = "humantime_serde")]
    pub average_holding_period: Duration,
}

impl PerformanceReport {
    /// Creates a new, zeroed-out PerformanceReport. This is what an empty set reports.
    pub fn new() -> Self {
        Self {
            total_pnl: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: None,
            expectancy: None,
            expectancy_r: None,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: None,
            sharpe_ratio: None,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            win_rate: None,
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            average_holding_period: Duration::ZERO,
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// A breakdown by a chosen psychology or trade attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBreakdown {
    pub attribute: GroupAttribute,
    pub groups: Vec<GroupStats>,
}

/// Everything a dashboard view needs, computed from one filtered pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalAnalysis {
    pub summary: PerformanceReport,
    pub equity_curve: Vec<EquityPoint>,
    pub drawdown: Vec<DrawdownPoint>,
    pub by_symbol: Vec<GroupStats>,
    pub by_day: Vec<DailyPnl>,
    pub grouped: Option<AttributeBreakdown>,
}

/// Losses the user stayed out of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvoidedSummary {
    pub count: usize,
    pub potential_loss: Decimal,
}
