//! Warnings about risky trading behaviour, derived from the trade history.
//!
//! Every check works on trades already in chronological order and is
//! independent of the clock: the caller says which day counts as today.

use crate::breakdown::{Tally, checked_add, checked_mul, pnl_sum};
use crate::curve;
use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::Trade;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The drawdown check needs this many trades.
pub const DRAWDOWN_MIN_TRADES: usize = 5;
/// The win-rate drop check needs this many trades.
pub const WIN_RATE_MIN_TRADES: usize = 20;
/// The most recent trades compared against the overall win rate.
pub const WIN_RATE_RECENT_TRADES: usize = 10;
/// The most recent trades inspected for oversized risk.
pub const HIGH_RISK_RECENT_TRADES: usize = 5;
/// More oversized trades than this among the recent ones raises an alert.
pub const HIGH_RISK_TOLERATED: usize = 2;
/// The revenge trading check needs this many trades.
pub const REVENGE_MIN_TRADES: usize = 10;
/// A day needs this many trades to be inspected for revenge trading.
pub const REVENGE_DAY_TRADES: usize = 4;
/// Losses after an opening loss that mark a day as revenge trading.
pub const REVENGE_FOLLOW_UP_LOSSES: usize = 2;

/// Limits past which an alert is raised. Percentages are in percent (`10` is 10%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Max drawdown as a percentage of the account size.
    pub max_drawdown_pct: Decimal,
    /// Loss in account currency for a single day.
    pub daily_loss_limit: Decimal,
    pub consecutive_losses: usize,
    /// Percentage points the recent win rate may fall below the overall one.
    pub win_rate_drop_pct: Decimal,
    pub daily_trade_limit: usize,
    /// Loss per trade as a percentage of the account size.
    pub risk_per_trade_pct: Decimal,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            max_drawdown_pct: dec!(10),
            daily_loss_limit: dec!(500),
            consecutive_losses: 3,
            win_rate_drop_pct: dec!(10),
            daily_trade_limit: 10,
            risk_per_trade_pct: dec!(2),
        }
    }
}

impl AlertThresholds {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let amounts = [
            ("max_drawdown_pct", self.max_drawdown_pct),
            ("daily_loss_limit", self.daily_loss_limit),
            ("win_rate_drop_pct", self.win_rate_drop_pct),
            ("risk_per_trade_pct", self.risk_per_trade_pct),
        ];
        for (name, value) in amounts {
            if value <= Decimal::ZERO {
                return Err(AnalyticsError::InvalidParameter(format!(
                    "alert threshold {name} must be positive, got {value}"
                )));
            }
        }
        if self.consecutive_losses == 0 || self.daily_trade_limit == 0 {
            return Err(AnalyticsError::InvalidParameter(
                "alert thresholds consecutive_losses and daily_trade_limit must be at least 1"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// What triggered an alert, with the figures behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertKind {
    MaxDrawdown {
        drawdown: Decimal,
        drawdown_pct: Decimal,
        threshold_pct: Decimal,
    },
    DailyLoss {
        date: NaiveDate,
        loss: Decimal,
        trades: usize,
        limit: Decimal,
    },
    /// `active` when the streak is still running at the latest trade.
    ConsecutiveLosses {
        count: usize,
        total_loss: Decimal,
        active: bool,
    },
    WinRateDrop {
        overall: Decimal,
        recent: Decimal,
        drop_pct: Decimal,
    },
    Overtrading {
        date: NaiveDate,
        trades: usize,
        pnl: Decimal,
        limit: usize,
    },
    HighRisk {
        oversized_trades: usize,
        average_risk_pct: Decimal,
        threshold_pct: Decimal,
    },
    /// Days that opened with a loss and kept losing on several more trades.
    RevengeTrading { days: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: AlertKind,
}

impl Alert {
    fn critical(kind: AlertKind) -> Self {
        Self { severity: Severity::Critical, kind }
    }

    fn warning(kind: AlertKind) -> Self {
        Self { severity: Severity::Warning, kind }
    }
}

/// Runs every check in a fixed order and keeps the ones that fire.
///
/// The drawdown and oversized-risk checks are measured against `account_size`
/// and are skipped without one.
pub(crate) fn check_all(
    ordered: &[&Trade],
    account_size: Option<Decimal>,
    thresholds: &AlertThresholds,
    as_of: NaiveDate,
) -> Result<Vec<Alert>, AnalyticsError> {
    let account_size = account_size.filter(|size| *size > Decimal::ZERO);
    let checks = [
        match account_size {
            Some(size) => max_drawdown(ordered, size, thresholds.max_drawdown_pct)?,
            None => None,
        },
        daily_loss(ordered, thresholds.daily_loss_limit, as_of)?,
        consecutive_losses(ordered, thresholds.consecutive_losses)?,
        win_rate_drop(ordered, thresholds.win_rate_drop_pct)?,
        overtrading(ordered, thresholds.daily_trade_limit, as_of)?,
        match account_size {
            Some(size) => high_risk(ordered, size, thresholds.risk_per_trade_pct)?,
            None => None,
        },
        revenge_trading(ordered),
    ];
    Ok(checks.into_iter().flatten().collect())
}

fn percent_of_account(amount: Decimal, account_size: Decimal) -> Result<Decimal, AnalyticsError> {
    let fraction = amount
        .checked_div(account_size)
        .ok_or_else(|| AnalyticsError::overflow("percent of account"))?;
    checked_mul(fraction, Decimal::ONE_HUNDRED, "percent of account")
}

fn max_drawdown(
    ordered: &[&Trade],
    account_size: Decimal,
    threshold_pct: Decimal,
) -> Result<Option<Alert>, AnalyticsError> {
    if ordered.len() < DRAWDOWN_MIN_TRADES {
        return Ok(None);
    }
    let drawdown = curve::max_drawdown(&curve::drawdown_points(&curve::equity_points(ordered)?)?);
    let drawdown_pct = percent_of_account(drawdown, account_size)?;
    Ok((drawdown_pct > threshold_pct).then(|| {
        Alert::critical(AlertKind::MaxDrawdown { drawdown, drawdown_pct, threshold_pct })
    }))
}

fn trades_on<'a>(ordered: &[&'a Trade], date: NaiveDate) -> Vec<&'a Trade> {
    ordered.iter().copied().filter(|t| t.date == date).collect()
}

/// Critical for a loss past the limit today, a warning for one yesterday.
fn daily_loss(
    ordered: &[&Trade],
    limit: Decimal,
    as_of: NaiveDate,
) -> Result<Option<Alert>, AnalyticsError> {
    let days = [Some(as_of), as_of.pred_opt()];
    for (index, date) in days.into_iter().flatten().enumerate() {
        let trades = trades_on(ordered, date);
        if trades.is_empty() {
            continue;
        }
        let pnl = pnl_sum(trades.iter().copied())?;
        if pnl < -limit {
            let kind = AlertKind::DailyLoss { date, loss: pnl.abs(), trades: trades.len(), limit };
            return Ok(Some(if index == 0 { Alert::critical(kind) } else { Alert::warning(kind) }));
        }
    }
    Ok(None)
}

/// The running streak when it is long enough, otherwise the latest finished one that was.
fn consecutive_losses(ordered: &[&Trade], threshold: usize) -> Result<Option<Alert>, AnalyticsError> {
    let mut streak = (0usize, Decimal::ZERO);
    let mut last_long_streak = None;
    for t in ordered {
        if t.is_loss() {
            streak = (streak.0 + 1, checked_add(streak.1, t.pnl, "losing streak")?);
        } else {
            if streak.0 >= threshold {
                last_long_streak = Some(streak);
            }
            streak = (0, Decimal::ZERO);
        }
    }

    let (count, total, active) = if streak.0 >= threshold {
        (streak.0, streak.1, true)
    } else if let Some((count, total)) = last_long_streak {
        (count, total, false)
    } else {
        return Ok(None);
    };
    Ok(Some(Alert::critical(AlertKind::ConsecutiveLosses {
        count,
        total_loss: total.abs(),
        active,
    })))
}

fn win_rate_drop(ordered: &[&Trade], threshold_pct: Decimal) -> Result<Option<Alert>, AnalyticsError> {
    if ordered.len() < WIN_RATE_MIN_TRADES {
        return Ok(None);
    }
    let recent_start = ordered.len() - WIN_RATE_RECENT_TRADES;
    let overall = Tally::of(ordered.iter().copied())?.win_rate();
    let recent = Tally::of(ordered[recent_start..].iter().copied())?.win_rate();
    let (Some(overall), Some(recent)) = (overall, recent) else {
        return Ok(None);
    };

    let drop_pct = (overall - recent) * Decimal::ONE_HUNDRED;
    Ok((drop_pct > threshold_pct)
        .then(|| Alert::warning(AlertKind::WinRateDrop { overall, recent, drop_pct })))
}

fn overtrading(
    ordered: &[&Trade],
    limit: usize,
    as_of: NaiveDate,
) -> Result<Option<Alert>, AnalyticsError> {
    let today = trades_on(ordered, as_of);
    if today.len() < limit {
        return Ok(None);
    }
    let pnl = pnl_sum(today.iter().copied())?;
    Ok(Some(Alert::warning(AlertKind::Overtrading {
        date: as_of,
        trades: today.len(),
        pnl,
        limit,
    })))
}

/// Looks at the size of recent results relative to the account as a proxy for the risk taken.
fn high_risk(
    ordered: &[&Trade],
    account_size: Decimal,
    threshold_pct: Decimal,
) -> Result<Option<Alert>, AnalyticsError> {
    if ordered.len() < HIGH_RISK_RECENT_TRADES {
        return Ok(None);
    }
    let recent = &ordered[ordered.len() - HIGH_RISK_RECENT_TRADES..];
    let risks = recent
        .iter()
        .map(|t| percent_of_account(t.pnl.abs(), account_size))
        .collect::<Result<Vec<_>, _>>()?;

    let oversized_trades = risks.iter().filter(|r| **r > threshold_pct).count();
    if oversized_trades <= HIGH_RISK_TOLERATED {
        return Ok(None);
    }
    let total = risks
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| checked_add(acc, *r, "average risk"))?;
    Ok(Some(Alert::warning(AlertKind::HighRisk {
        oversized_trades,
        average_risk_pct: total / Decimal::from(risks.len()),
        threshold_pct,
    })))
}

fn revenge_trading(ordered: &[&Trade]) -> Option<Alert> {
    if ordered.len() < REVENGE_MIN_TRADES {
        return None;
    }
    let mut days: BTreeMap<NaiveDate, Vec<&Trade>> = BTreeMap::new();
    for t in ordered {
        days.entry(t.date).or_default().push(t);
    }

    let revenge_days = days
        .values()
        .filter(|day| day.len() >= REVENGE_DAY_TRADES)
        .filter(|day| {
            day[0].is_loss()
                && day[1..].iter().filter(|t| t.is_loss()).count() >= REVENGE_FOLLOW_UP_LOSSES
        })
        .count();

    (revenge_days > 0).then(|| Alert::warning(AlertKind::RevengeTrading { days: revenge_days }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::chronological;
    use crate::test_support::{at, trade};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn run(trades: &[Trade], account_size: Option<Decimal>, as_of: NaiveDate) -> Vec<Alert> {
        let ordered = chronological(trades.iter().collect());
        check_all(&ordered, account_size, &AlertThresholds::default(), as_of).unwrap()
    }

    #[test]
    fn quiet_history_raises_nothing() {
        let trades: Vec<Trade> = (1..=6).map(|d| trade("A", 2024, 5, d, dec!(20))).collect();
        assert_eq!(run(&trades, Some(dec!(10000)), day(6)), vec![]);
    }

    #[test]
    fn drawdown_past_ten_percent_of_the_account() {
        let trades = vec![
            trade("A", 2024, 5, 1, dec!(50)),
            trade("A", 2024, 5, 2, dec!(-60)),
            trade("A", 2024, 5, 3, dec!(10)),
            trade("A", 2024, 5, 4, dec!(-60)),
            trade("A", 2024, 5, 5, dec!(30)),
        ];
        let alerts = run(&trades, Some(dec!(1000)), day(20));
        assert_eq!(
            alerts[0],
            Alert::critical(AlertKind::MaxDrawdown {
                drawdown: dec!(110),
                drawdown_pct: dec!(11),
                threshold_pct: dec!(10),
            })
        );

        let without_account = run(&trades, None, day(20));
        assert!(without_account.iter().all(|a| !matches!(a.kind, AlertKind::MaxDrawdown { .. })));
    }

    #[test]
    fn daily_loss_today_is_critical_and_yesterday_a_warning() {
        let trades = vec![
            trade("A", 2024, 5, 9, dec!(-60)),
            trade("A", 2024, 5, 9, dec!(-50)),
        ];
        let thresholds = AlertThresholds { daily_loss_limit: dec!(100), ..AlertThresholds::default() };
        let ordered = chronological(trades.iter().collect());

        let today = daily_loss(&ordered, thresholds.daily_loss_limit, day(9)).unwrap().unwrap();
        assert_eq!(today.severity, Severity::Critical);
        assert_eq!(
            today.kind,
            AlertKind::DailyLoss { date: day(9), loss: dec!(110), trades: 2, limit: dec!(100) }
        );

        let next_day = daily_loss(&ordered, thresholds.daily_loss_limit, day(10)).unwrap().unwrap();
        assert_eq!(next_day.severity, Severity::Warning);

        assert_eq!(daily_loss(&ordered, thresholds.daily_loss_limit, day(12)).unwrap(), None);
    }

    #[test]
    fn an_active_losing_streak_is_reported_over_an_old_one() {
        let trades = vec![
            trade("A", 2024, 5, 1, dec!(-1)),
            trade("A", 2024, 5, 2, dec!(-1)),
            trade("A", 2024, 5, 3, dec!(-1)),
            trade("A", 2024, 5, 4, dec!(-1)),
            trade("A", 2024, 5, 5, dec!(5)),
            trade("A", 2024, 5, 6, dec!(-2)),
            trade("A", 2024, 5, 7, dec!(-2)),
            trade("A", 2024, 5, 8, dec!(-2)),
        ];
        let ordered = chronological(trades.iter().collect());
        assert_eq!(
            consecutive_losses(&ordered, 3).unwrap().map(|a| a.kind),
            Some(AlertKind::ConsecutiveLosses { count: 3, total_loss: dec!(6), active: true })
        );
        assert_eq!(
            consecutive_losses(&ordered[..5], 3).unwrap().map(|a| a.kind),
            Some(AlertKind::ConsecutiveLosses { count: 4, total_loss: dec!(4), active: false })
        );
        assert_eq!(consecutive_losses(&ordered, 5).unwrap(), None);
    }

    #[test]
    fn recent_win_rate_falling_behind_the_overall_one() {
        let mut trades: Vec<Trade> = (1..=10).map(|d| trade("A", 2024, 5, d, dec!(10))).collect();
        trades.extend((11..=20).map(|d| {
            trade("A", 2024, 5, d, if d % 2 == 0 { dec!(10) } else { dec!(-10) })
        }));
        let ordered = chronological(trades.iter().collect());

        // overall 15 / 20, recent 5 / 10
        let alert = win_rate_drop(&ordered, dec!(10)).unwrap().unwrap();
        assert_eq!(
            alert.kind,
            AlertKind::WinRateDrop { overall: dec!(0.75), recent: dec!(0.5), drop_pct: dec!(25) }
        );
        assert_eq!(win_rate_drop(&ordered[..19], dec!(10)).unwrap(), None);
    }

    #[test]
    fn overtrading_counts_only_the_given_day() {
        let trades: Vec<Trade> = (0..10)
            .map(|i| at(trade("A", 2024, 5, 9, dec!(1)), 9 + i, 0))
            .collect();
        let ordered = chronological(trades.iter().collect());
        let alert = overtrading(&ordered, 10, day(9)).unwrap().unwrap();
        assert_eq!(
            alert.kind,
            AlertKind::Overtrading { date: day(9), trades: 10, pnl: dec!(10), limit: 10 }
        );
        assert_eq!(overtrading(&ordered, 10, day(10)).unwrap(), None);
    }

    #[test]
    fn most_of_the_last_five_oversized() {
        let trades = vec![
            trade("A", 2024, 5, 1, dec!(50)),
            trade("A", 2024, 5, 2, dec!(-30)),
            trade("A", 2024, 5, 3, dec!(40)),
            trade("A", 2024, 5, 4, dec!(5)),
            trade("A", 2024, 5, 5, dec!(-25)),
        ];
        let ordered = chronological(trades.iter().collect());
        // Against 1000: 5%, 3%, 4%, 0.5%, 2.5%.
        let alert = high_risk(&ordered, dec!(1000), dec!(2)).unwrap().unwrap();
        assert_eq!(
            alert.kind,
            AlertKind::HighRisk {
                oversized_trades: 4,
                average_risk_pct: dec!(3),
                threshold_pct: dec!(2),
            }
        );
        assert_eq!(high_risk(&ordered, dec!(100000), dec!(2)).unwrap(), None);
    }

    #[test]
    fn revenge_days_open_with_a_loss_and_keep_losing() {
        let mut trades: Vec<Trade> = (1..=6).map(|d| trade("A", 2024, 5, d, dec!(3))).collect();
        let session = [dec!(-5), dec!(4), dec!(-6), dec!(-7)];
        for (i, pnl) in session.into_iter().enumerate() {
            trades.push(at(trade("A", 2024, 5, 8, pnl), 10 + i as u32, 0));
        }
        let ordered = chronological(trades.iter().collect());
        assert_eq!(
            revenge_trading(&ordered).map(|a| a.kind),
            Some(AlertKind::RevengeTrading { days: 1 })
        );

        let calm: Vec<Trade> = (1..=10).map(|d| trade("A", 2024, 5, d, dec!(-1))).collect();
        let ordered = chronological(calm.iter().collect());
        assert_eq!(revenge_trading(&ordered), None);
    }

    #[test]
    fn thresholds_must_be_positive() {
        let bad = AlertThresholds { consecutive_losses: 0, ..AlertThresholds::default() };
        assert!(matches!(bad.validate(), Err(AnalyticsError::InvalidParameter(_))));
        assert!(AlertThresholds::default().validate().is_ok());
    }
}
