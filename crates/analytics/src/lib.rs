//! # Tradelog Analytics Engine
//!
//! This crate turns a trader's journal into numbers: win rate, PnL totals,
//! expectancy, equity and drawdown curves, and breakdowns by symbol, day and
//! psychology attribute.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of storage
//!   or presentation. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `AnalyticsEngine` takes the record collection
//!   and a `TradeFilter` as explicit inputs and returns a value. The filter is
//!   applied before any aggregation, and no call mutates its input.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The calculation entry points.
//! - `risk`: Position sizing, Kelly, required win rate, profit targets and risk of ruin.
//! - `Alert` / `AlertThresholds`: Warnings about drawdown, losing streaks and overtrading.
//! - `TradeFilter`: Account, date range, user and symbol selection.
//! - `PerformanceReport` / `JournalAnalysis`: The result structs.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod alerts;
pub mod breakdown;
pub mod curve;
pub mod engine;
pub mod error;
pub mod filter;
pub mod report;
pub mod risk;

// Re-export the key components to create a clean, public-facing API.
pub use alerts::{Alert, AlertKind, AlertThresholds, Severity};
pub use breakdown::{
    DailyPnl, GroupAttribute, GroupStats, MistakeCount, MonthlyPnl, ScoreAttribute, ScoreSplit,
    best_and_worst,
};
pub use curve::{DrawdownPoint, EquityPoint};
pub use engine::{AnalyticsEngine, DEFAULT_ANNUALIZATION_DAYS};
pub use error::AnalyticsError;
pub use filter::TradeFilter;
pub use report::{AttributeBreakdown, AvoidedSummary, JournalAnalysis, PerformanceReport};
pub use risk::{KellyCriterion, PositionSize, ProfitTarget, RiskOfRuin, RiskReward};
