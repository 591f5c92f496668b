use crate::alerts::{self, Alert, AlertThresholds};
use crate::breakdown::{
    self, DailyPnl, GroupAttribute, GroupStats, MistakeCount, MonthlyPnl, ScoreAttribute,
    ScoreSplit, Tally, checked_add, checked_mul, checked_sub,
};
use crate::curve::{self, DrawdownPoint, EquityPoint};
use crate::error::AnalyticsError;
use crate::filter::TradeFilter;
use crate::report::{AttributeBreakdown, AvoidedSummary, JournalAnalysis, PerformanceReport};
use crate::risk::{self, KellyCriterion};
use chrono::{Datelike, NaiveDate};
use core_types::{AvoidedTrade, Mistake, Record, Trade};
use rust_decimal::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

/// Trading days per year used to annualize the Sharpe ratio unless configured otherwise.
pub const DEFAULT_ANNUALIZATION_DAYS: u32 = 252;

/// A stateless calculator for deriving performance metrics from journal records.
///
/// Every method takes the full record collection plus a filter, applies the
/// filter first, and returns a fresh value. Inputs are only borrowed, so the
/// same call on the same data always yields the same result.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    annualization_days: u32,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self {
            annualization_days: DEFAULT_ANNUALIZATION_DAYS,
        }
    }
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_annualization_days(mut self, days: u32) -> Self {
        self.annualization_days = days;
        self
    }

    /// The main entry point for analyzing a journal in one pass.
    ///
    /// # Arguments
    ///
    /// * `trades` - Every trade in the journal. Only those admitted by `filter` are used.
    /// * `filter` - The account, user, date range and symbol selection, applied before
    ///   any aggregation.
    /// * `group_by` - An optional attribute for an extra breakdown, e.g. mood or setup.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `JournalAnalysis` (summary, equity and drawdown curves,
    /// per-symbol and per-day breakdowns) or an `AnalyticsError`.
    pub fn analyze(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
        group_by: Option<GroupAttribute>,
    ) -> Result<JournalAnalysis, AnalyticsError> {
        let selected = filter.apply(trades)?;
        tracing::debug!(
            total = trades.len(),
            selected = selected.len(),
            group_by = ?group_by,
            "Analyzing journal."
        );

        let ordered = curve::chronological(selected);
        let equity_curve = curve::equity_points(&ordered)?;
        let drawdown = curve::drawdown_points(&equity_curve)?;
        let summary = self.report(&ordered, &drawdown)?;
        let grouped = match group_by {
            Some(attribute) => Some(AttributeBreakdown {
                attribute,
                groups: breakdown::group_by_average(&ordered, |t| attribute.key(t))?,
            }),
            None => None,
        };

        Ok(JournalAnalysis {
            summary,
            by_symbol: breakdown::group_by_total(&ordered, |t| GroupAttribute::Symbol.key(t))?,
            by_day: breakdown::daily(&ordered)?,
            grouped,
            equity_curve,
            drawdown,
        })
    }

    /// Calculates the headline performance metrics.
    ///
    /// # Arguments
    ///
    /// * `trades` - Every trade in the journal. Only those admitted by `filter` are used.
    /// * `filter` - The selection applied before any aggregation.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceReport` or an `AnalyticsError`. An empty
    /// selection yields the zeroed report; amounts too large for a `Decimal` yield
    /// `AnalyticsError::Calculation`.
    pub fn summarize(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<PerformanceReport, AnalyticsError> {
        let ordered = curve::chronological(filter.apply(trades)?);
        let drawdown = curve::drawdown_points(&curve::equity_points(&ordered)?)?;
        self.report(&ordered, &drawdown)
    }

    /// Wins over decisive trades; `None` when the filtered set has no wins or losses.
    pub fn win_rate(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Option<Decimal>, AnalyticsError> {
        Ok(self.tally(trades, filter)?.win_rate())
    }

    pub fn total_pnl(&self, trades: &[Trade], filter: &TradeFilter) -> Result<Decimal, AnalyticsError> {
        Ok(self.tally(trades, filter)?.total_pnl)
    }

    /// Average PnL per trade; `None` for an empty set.
    pub fn expectancy(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Option<Decimal>, AnalyticsError> {
        Ok(self.tally(trades, filter)?.average_pnl())
    }

    pub fn equity_curve(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<EquityPoint>, AnalyticsError> {
        let ordered = curve::chronological(filter.apply(trades)?);
        curve::equity_points(&ordered)
    }

    pub fn drawdown_curve(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<DrawdownPoint>, AnalyticsError> {
        let ordered = curve::chronological(filter.apply(trades)?);
        curve::drawdown_points(&curve::equity_points(&ordered)?)
    }

    /// Per-symbol statistics ordered by total PnL, highest first. Symbols group case-insensitively.
    pub fn by_symbol(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<GroupStats>, AnalyticsError> {
        let selected = filter.apply(trades)?;
        breakdown::group_by_total(&selected, |t| GroupAttribute::Symbol.key(t))
    }

    /// PnL per calendar date, ascending. Days without trades are not emitted.
    pub fn by_day(&self, trades: &[Trade], filter: &TradeFilter) -> Result<Vec<DailyPnl>, AnalyticsError> {
        breakdown::daily(&filter.apply(trades)?)
    }

    /// The days of one month that have trades; the caller fills in the rest of the grid.
    pub fn calendar_month(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyPnl>, AnalyticsError> {
        if !(1..=12).contains(&month) {
            return Err(AnalyticsError::InvalidFilter(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        let selected: Vec<&Trade> = filter
            .apply(trades)?
            .into_iter()
            .filter(|t| t.date.year() == year && t.date.month() == month)
            .collect();
        breakdown::daily(&selected)
    }

    pub fn by_month(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<MonthlyPnl>, AnalyticsError> {
        breakdown::monthly(&filter.apply(trades)?)
    }

    pub fn by_weekday(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<GroupStats>, AnalyticsError> {
        breakdown::weekdays(&filter.apply(trades)?)
    }

    pub fn by_hour(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<GroupStats>, AnalyticsError> {
        breakdown::hours(&filter.apply(trades)?)
    }

    /// Win rate and average PnL per value of `attribute`, best average first.
    ///
    /// This is how the journal surfaces the conditions a trader performs best in.
    pub fn by_attribute(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
        attribute: GroupAttribute,
    ) -> Result<Vec<GroupStats>, AnalyticsError> {
        let selected = filter.apply(trades)?;
        breakdown::group_by_average(&selected, |t| attribute.key(t))
    }

    pub fn score_correlation(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
        score: ScoreAttribute,
    ) -> Result<Option<Decimal>, AnalyticsError> {
        breakdown::score_correlation(&filter.apply(trades)?, score)
    }

    /// Average PnL with a high (4 or 5) versus a low (1 or 2) value of `score`.
    pub fn score_split(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
        score: ScoreAttribute,
    ) -> Result<ScoreSplit, AnalyticsError> {
        breakdown::score_split(&filter.apply(trades)?, score)
    }

    /// `score_split` for every psychology score, in `ScoreAttribute::ALL` order.
    pub fn psychology_insights(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Vec<ScoreSplit>, AnalyticsError> {
        let selected = filter.apply(trades)?;
        ScoreAttribute::ALL
            .iter()
            .map(|score| breakdown::score_split(&selected, *score))
            .collect()
    }

    /// Kelly position sizing from the filtered history.
    ///
    /// `None` below `risk::KELLY_MIN_TRADES` trades or without both wins and losses.
    pub fn kelly_criterion(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
    ) -> Result<Option<KellyCriterion>, AnalyticsError> {
        let selected = filter.apply(trades)?;
        if selected.len() < risk::KELLY_MIN_TRADES {
            return Ok(None);
        }
        risk::kelly_criterion(&Tally::of(selected.iter().copied())?)
    }

    /// Runs every alert check over the filtered trades.
    ///
    /// # Arguments
    ///
    /// * `account_size` - The balance drawdown and risk percentages are measured
    ///   against. The two account-relative checks are skipped when it is `None`.
    /// * `as_of` - The day treated as "today" by the daily loss and overtrading checks.
    ///
    /// # Returns
    ///
    /// The triggered alerts in check order; empty when trading is within limits.
    pub fn alerts(
        &self,
        trades: &[Trade],
        filter: &TradeFilter,
        account_size: Option<Decimal>,
        thresholds: &AlertThresholds,
        as_of: NaiveDate,
    ) -> Result<Vec<Alert>, AnalyticsError> {
        thresholds.validate()?;
        let ordered = curve::chronological(filter.apply(trades)?);
        let alerts = alerts::check_all(&ordered, account_size, thresholds, as_of)?;
        tracing::debug!(trades = ordered.len(), alerts = alerts.len(), %as_of, "Alert checks complete.");
        Ok(alerts)
    }

    /// How often each mistake type was logged, most frequent first.
    ///
    /// Only the user and date parts of the filter apply to mistakes.
    pub fn mistake_frequency(
        &self,
        mistakes: &[Record<Mistake>],
        filter: &TradeFilter,
    ) -> Result<Vec<MistakeCount>, AnalyticsError> {
        filter.validate()?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for m in mistakes.iter().filter(|m| filter.admits(m.body.user_id, m.body.date)) {
            *counts.entry(m.body.mistake_type.as_str()).or_insert(0) += 1;
        }
        let mut frequency: Vec<MistakeCount> = counts
            .into_iter()
            .map(|(mistake_type, count)| MistakeCount {
                mistake_type: mistake_type.to_string(),
                count,
            })
            .collect();
        frequency.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mistake_type.cmp(&b.mistake_type)));
        Ok(frequency)
    }

    /// Count and total potential loss of avoided trades. The account part of the filter is ignored.
    pub fn avoided_summary(
        &self,
        avoided: &[Record<AvoidedTrade>],
        filter: &TradeFilter,
    ) -> Result<AvoidedSummary, AnalyticsError> {
        filter.validate()?;
        avoided
            .iter()
            .map(|a| &a.body)
            .filter(|a| filter.admits(a.user_id, a.date) && filter.matches_symbol(&a.symbol))
            .try_fold(AvoidedSummary::default(), |mut acc, a| {
                acc.count += 1;
                acc.potential_loss = checked_add(acc.potential_loss, a.potential_loss, "avoided losses")?;
                Ok(acc)
            })
    }

    fn tally(&self, trades: &[Trade], filter: &TradeFilter) -> Result<Tally, AnalyticsError> {
        Tally::of(filter.apply(trades)?)
    }

    /// Builds the summary from trades already in chronological order.
    fn report(
        &self,
        ordered: &[&Trade],
        drawdown: &[DrawdownPoint],
    ) -> Result<PerformanceReport, AnalyticsError> {
        let mut report = PerformanceReport::new();
        if ordered.is_empty() {
            // No trades: counts and totals stay zero, ratios stay undefined.
            return Ok(report);
        }

        let tally = Tally::of(ordered.iter().copied())?;

        // --- Profitability ---
        report.total_trades = tally.trades;
        report.winning_trades = tally.wins;
        report.losing_trades = tally.losses;
        report.breakeven_trades = tally.breakeven;
        report.total_pnl = tally.total_pnl;
        report.gross_profit = tally.gross_profit;
        report.gross_loss = tally.gross_loss;
        report.win_rate = tally.win_rate();
        report.expectancy = tally.average_pnl();
        report.expectancy_r = tally.average_r();

        if tally.gross_loss > Decimal::ZERO {
            report.profit_factor = Some(
                tally
                    .gross_profit
                    .checked_div(tally.gross_loss)
                    .ok_or_else(|| AnalyticsError::overflow("profit factor"))?,
            );
        }
        if tally.wins > 0 {
            report.average_win = tally.gross_profit / Decimal::from(tally.wins);
        }
        if tally.losses > 0 {
            report.average_loss = tally.gross_loss / Decimal::from(tally.losses);
        }
        report.largest_win = ordered
            .iter()
            .map(|t| t.pnl)
            .filter(|p| *p > Decimal::ZERO)
            .max()
            .unwrap_or_default();
        report.largest_loss = ordered
            .iter()
            .map(|t| t.pnl)
            .filter(|p| *p < Decimal::ZERO)
            .min()
            .map(|p| p.abs())
            .unwrap_or_default();

        // --- Risk ---
        report.max_drawdown = curve::max_drawdown(drawdown);
        report.max_drawdown_pct = curve::max_drawdown_pct(drawdown);
        report.sharpe_ratio = self.sharpe_ratio(ordered)?;
        (report.max_consecutive_wins, report.max_consecutive_losses) = curve::streaks(ordered);

        // --- Time ---
        let total_minutes: u64 = ordered.iter().map(|t| u64::from(t.duration_minutes)).sum();
        report.average_holding_period =
            Duration::from_secs(total_minutes * 60 / ordered.len() as u64);

        Ok(report)
    }

    /// Mean per-trade PnL over its sample standard deviation, annualized.
    fn sharpe_ratio(&self, ordered: &[&Trade]) -> Result<Option<Decimal>, AnalyticsError> {
        if ordered.len() < 2 {
            return Ok(None);
        }

        let n = Decimal::from(ordered.len());
        let mean = breakdown::pnl_sum(ordered.iter().copied())? / n;
        let mut squared_deviations = Decimal::ZERO;
        for t in ordered {
            let deviation = checked_sub(t.pnl, mean, "pnl deviation")?;
            squared_deviations = checked_add(
                squared_deviations,
                checked_mul(deviation, deviation, "pnl variance")?,
                "pnl variance",
            )?;
        }
        let variance = squared_deviations / (n - Decimal::ONE);

        if variance <= Decimal::ZERO {
            return Ok(None);
        }

        let std_dev = variance.sqrt().ok_or_else(|| {
            AnalyticsError::Calculation("Failed to calculate square root for variance".to_string())
        })?;
        let annualization = Decimal::from(self.annualization_days).sqrt().ok_or_else(|| {
            AnalyticsError::Calculation("Failed to calculate square root for annualization".to_string())
        })?;

        Ok(Some(checked_mul(mean / std_dev, annualization, "sharpe ratio")?))
    }
}
