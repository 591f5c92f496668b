use crate::breakdown::{checked_add, checked_sub};
use crate::error::AnalyticsError;
use chrono::{NaiveDate, NaiveTime};
use core_types::Trade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One point per trade on the cumulative PnL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub trade_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub pnl: Decimal,
    pub cumulative: Decimal,
}

/// Distance of the equity curve below its running high. `drawdown` is never positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub cumulative: Decimal,
    pub peak: Decimal,
    pub drawdown: Decimal,
}

/// Puts trades in chronological order: date, then time of day, then input order.
///
/// Untimed trades come before timed ones on the same date. The sort is stable,
/// so equal keys keep their insertion order.
pub fn chronological<'a>(mut trades: Vec<&'a Trade>) -> Vec<&'a Trade> {
    trades.sort_by_key(|t| (t.date, t.time));
    trades
}

/// Running sum of PnL over trades that are already in chronological order.
pub fn equity_points(ordered: &[&Trade]) -> Result<Vec<EquityPoint>, AnalyticsError> {
    let mut cumulative = Decimal::ZERO;
    ordered
        .iter()
        .map(|t| {
            cumulative = checked_add(cumulative, t.pnl, "cumulative pnl")?;
            Ok(EquityPoint {
                trade_id: t.id,
                date: t.date,
                time: t.time,
                pnl: t.pnl,
                cumulative,
            })
        })
        .collect()
}

/// Underwater curve. The running peak starts at zero, the equity before the first trade.
pub fn drawdown_points(equity: &[EquityPoint]) -> Result<Vec<DrawdownPoint>, AnalyticsError> {
    let mut peak = Decimal::ZERO;
    equity
        .iter()
        .map(|p| {
            peak = peak.max(p.cumulative);
            Ok(DrawdownPoint {
                date: p.date,
                time: p.time,
                cumulative: p.cumulative,
                peak,
                drawdown: checked_sub(p.cumulative, peak, "drawdown")?,
            })
        })
        .collect()
}

/// Largest peak-to-trough fall, reported as a positive amount.
pub fn max_drawdown(drawdown: &[DrawdownPoint]) -> Decimal {
    drawdown
        .iter()
        .map(|p| -p.drawdown)
        .fold(Decimal::ZERO, Decimal::max)
}

/// Max drawdown as a percentage of the highest equity peak.
///
/// `None` while the curve has never been above zero.
pub fn max_drawdown_pct(drawdown: &[DrawdownPoint]) -> Option<Decimal> {
    let peak = drawdown.iter().map(|p| p.peak).max()?;
    if peak <= Decimal::ZERO {
        return None;
    }
    (max_drawdown(drawdown) / peak).checked_mul(Decimal::ONE_HUNDRED)
}

/// Longest run of consecutive wins and of consecutive losses. Breakeven ends both.
pub fn streaks(ordered: &[&Trade]) -> (usize, usize) {
    let (mut wins, mut losses) = (0usize, 0usize);
    let (mut max_wins, mut max_losses) = (0usize, 0usize);
    for t in ordered {
        if t.is_win() {
            wins += 1;
            losses = 0;
        } else if t.is_loss() {
            losses += 1;
            wins = 0;
        } else {
            wins = 0;
            losses = 0;
        }
        max_wins = max_wins.max(wins);
        max_losses = max_losses.max(losses);
    }
    (max_wins, max_losses)
}
