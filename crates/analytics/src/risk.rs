//! Position sizing and risk-of-ruin calculators.
//!
//! Percentages follow the `_pct` convention: `1` means one percent. Plain rates
//! such as `win_rate` are fractions between 0 and 1.

use crate::breakdown::{Tally, checked_add, checked_mul};
use crate::error::AnalyticsError;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Kelly sizing needs at least this many trades of history.
pub const KELLY_MIN_TRADES: usize = 20;

/// The equity loss, in percent, counted as ruin.
pub const RUIN_DRAWDOWN_PCT: Decimal = dec!(50);

/// The R-multiples used when no targets are given.
pub const DEFAULT_R_MULTIPLES: [Decimal; 4] = [dec!(1), dec!(2), dec!(3), dec!(5)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Units to buy or sell so a stop-out loses exactly `risk_amount`.
    pub units: Decimal,
    pub position_value: Decimal,
    pub risk_amount: Decimal,
    pub risk_pct: Decimal,
    /// Distance between entry and stop per unit.
    pub stop_distance: Decimal,
    /// Position value over account balance.
    pub leverage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub risk: Decimal,
    pub reward: Decimal,
    /// Reward per unit of risk.
    pub ratio: Decimal,
    pub risk_pct: Decimal,
    pub reward_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KellyCriterion {
    /// Suggested percent of the account to risk per trade. Never negative.
    pub kelly_pct: Decimal,
    pub half_kelly_pct: Decimal,
    pub win_rate: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub win_loss_ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTarget {
    pub r_multiple: Decimal,
    /// Price move from entry, `r_multiple` times the risk per unit.
    pub profit: Decimal,
    pub long_target: Decimal,
    pub short_target: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskOfRuin {
    /// Chance of losing `RUIN_DRAWDOWN_PCT` of the account in a row of straight losses.
    pub ruin_pct: Decimal,
    /// Consecutive full-risk losses that add up to the ruin drawdown.
    pub losses_to_ruin: Decimal,
    pub risk_per_trade_pct: Decimal,
    pub win_rate: Decimal,
}

fn require_positive(name: &str, value: Decimal) -> Result<(), AnalyticsError> {
    if value <= Decimal::ZERO {
        return Err(AnalyticsError::InvalidParameter(format!(
            "{name} must be positive, got {value}"
        )));
    }
    Ok(())
}

fn require_percentage(name: &str, value: Decimal) -> Result<(), AnalyticsError> {
    require_positive(name, value)?;
    if value > Decimal::ONE_HUNDRED {
        return Err(AnalyticsError::InvalidParameter(format!(
            "{name} must be at most 100, got {value}"
        )));
    }
    Ok(())
}

fn percent_of(part: Decimal, whole: Decimal, quantity: &str) -> Result<Decimal, AnalyticsError> {
    let fraction = part.checked_div(whole).ok_or_else(|| AnalyticsError::overflow(quantity))?;
    checked_mul(fraction, Decimal::ONE_HUNDRED, quantity)
}

/// Fixed-fractional sizing: risk `risk_pct` of `balance` between `entry` and `stop_loss`.
pub fn position_size(
    balance: Decimal,
    risk_pct: Decimal,
    entry: Decimal,
    stop_loss: Decimal,
) -> Result<PositionSize, AnalyticsError> {
    require_positive("balance", balance)?;
    require_percentage("risk_pct", risk_pct)?;
    require_positive("entry", entry)?;
    require_positive("stop_loss", stop_loss)?;

    let stop_distance = (entry - stop_loss).abs();
    if stop_distance.is_zero() {
        return Err(AnalyticsError::InvalidParameter(
            "stop loss must differ from entry".to_string(),
        ));
    }

    let risk_amount = checked_mul(balance, risk_pct, "risk amount")? / Decimal::ONE_HUNDRED;
    let units = risk_amount
        .checked_div(stop_distance)
        .ok_or_else(|| AnalyticsError::overflow("position size"))?;
    let position_value = checked_mul(units, entry, "position value")?;

    Ok(PositionSize {
        units,
        position_value,
        risk_amount,
        risk_pct,
        stop_distance,
        leverage: position_value
            .checked_div(balance)
            .ok_or_else(|| AnalyticsError::overflow("leverage"))?,
    })
}

pub fn risk_reward(
    entry: Decimal,
    stop_loss: Decimal,
    take_profit: Decimal,
) -> Result<RiskReward, AnalyticsError> {
    require_positive("entry", entry)?;
    require_positive("stop_loss", stop_loss)?;
    require_positive("take_profit", take_profit)?;

    let risk = (entry - stop_loss).abs();
    if risk.is_zero() {
        return Err(AnalyticsError::InvalidParameter(
            "stop loss must differ from entry".to_string(),
        ));
    }
    let reward = (take_profit - entry).abs();

    Ok(RiskReward {
        ratio: reward
            .checked_div(risk)
            .ok_or_else(|| AnalyticsError::overflow("risk/reward ratio"))?,
        risk_pct: percent_of(risk, entry, "risk percentage")?,
        reward_pct: percent_of(reward, entry, "reward percentage")?,
        risk,
        reward,
    })
}

/// `K = W - (1 - W) / R`, with `W` the win rate and `R` average win over average loss.
///
/// Breakeven trades are left out of `W` the same way they are left out of the
/// report's win rate. `None` without both wins and losses.
pub(crate) fn kelly_criterion(tally: &Tally) -> Result<Option<KellyCriterion>, AnalyticsError> {
    if tally.wins == 0 || tally.losses == 0 {
        return Ok(None);
    }
    let Some(win_rate) = tally.win_rate() else {
        return Ok(None);
    };
    let average_win = tally.gross_profit / Decimal::from(tally.wins);
    let average_loss = tally.gross_loss / Decimal::from(tally.losses);
    let win_loss_ratio = average_win
        .checked_div(average_loss)
        .ok_or_else(|| AnalyticsError::overflow("win/loss ratio"))?;

    let loss_term = (Decimal::ONE - win_rate)
        .checked_div(win_loss_ratio)
        .ok_or_else(|| AnalyticsError::overflow("kelly fraction"))?;
    let kelly = (win_rate - loss_term).max(Decimal::ZERO);
    let kelly_pct = kelly * Decimal::ONE_HUNDRED;

    Ok(Some(KellyCriterion {
        kelly_pct,
        half_kelly_pct: kelly_pct / dec!(2),
        win_rate,
        average_win,
        average_loss,
        win_loss_ratio,
    }))
}

/// Minimum win rate to break even at a reward-to-risk `ratio`: `1 / (1 + ratio)`.
pub fn required_win_rate(ratio: Decimal) -> Result<Decimal, AnalyticsError> {
    require_positive("ratio", ratio)?;
    let denominator = checked_add(Decimal::ONE, ratio, "required win rate")?;
    Ok(Decimal::ONE / denominator)
}

/// Exit prices at each of `r_multiples` times the per-unit risk.
pub fn profit_targets(
    entry: Decimal,
    risk_per_unit: Decimal,
    r_multiples: &[Decimal],
) -> Result<Vec<ProfitTarget>, AnalyticsError> {
    require_positive("entry", entry)?;
    require_positive("risk_per_unit", risk_per_unit)?;

    r_multiples
        .iter()
        .map(|&r_multiple| {
            require_positive("r_multiple", r_multiple)?;
            let profit = checked_mul(risk_per_unit, r_multiple, "profit target")?;
            Ok(ProfitTarget {
                r_multiple,
                profit,
                long_target: checked_add(entry, profit, "long target")?,
                short_target: entry - profit,
            })
        })
        .collect()
}

/// Probability of a losing run long enough to cost `RUIN_DRAWDOWN_PCT` of the account.
///
/// A simplified model: `(1 - win_rate) ^ (RUIN_DRAWDOWN_PCT / risk_per_trade_pct)`.
pub fn risk_of_ruin(risk_per_trade_pct: Decimal, win_rate: Decimal) -> Result<RiskOfRuin, AnalyticsError> {
    require_percentage("risk_per_trade_pct", risk_per_trade_pct)?;
    if win_rate < Decimal::ZERO || win_rate > Decimal::ONE {
        return Err(AnalyticsError::InvalidParameter(format!(
            "win_rate must be between 0 and 1, got {win_rate}"
        )));
    }

    let losses_to_ruin = RUIN_DRAWDOWN_PCT
        .checked_div(risk_per_trade_pct)
        .ok_or_else(|| AnalyticsError::overflow("losing run length"))?;
    let loss_rate = Decimal::ONE - win_rate;
    // The base is at most one, so a failed power can only be an underflow.
    let probability = loss_rate.checked_powd(losses_to_ruin).unwrap_or(Decimal::ZERO);

    Ok(RiskOfRuin {
        ruin_pct: probability * Decimal::ONE_HUNDRED,
        losses_to_ruin,
        risk_per_trade_pct,
        win_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trade;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_percent_of_ten_thousand_over_a_two_dollar_stop() {
        let size = position_size(dec!(10000), dec!(1), dec!(50), dec!(48)).unwrap();
        assert_eq!(size.risk_amount, dec!(100));
        assert_eq!(size.stop_distance, dec!(2));
        assert_eq!(size.units, dec!(50));
        assert_eq!(size.position_value, dec!(2500));
        assert_eq!(size.leverage, dec!(0.25));
    }

    #[test]
    fn sizing_rejects_a_stop_on_the_entry() {
        assert!(matches!(
            position_size(dec!(10000), dec!(1), dec!(50), dec!(50)),
            Err(AnalyticsError::InvalidParameter(_))
        ));
        assert!(position_size(dec!(10000), dec!(0), dec!(50), dec!(48)).is_err());
        assert!(position_size(dec!(10000), dec!(150), dec!(50), dec!(48)).is_err());
    }

    #[test]
    fn risk_reward_works_for_shorts_too() {
        let long = risk_reward(dec!(100), dec!(95), dec!(115)).unwrap();
        assert_eq!((long.risk, long.reward, long.ratio), (dec!(5), dec!(15), dec!(3)));
        assert_eq!((long.risk_pct, long.reward_pct), (dec!(5), dec!(15)));

        let short = risk_reward(dec!(100), dec!(105), dec!(90)).unwrap();
        assert_eq!(short.ratio, dec!(2));
    }

    #[test]
    fn kelly_from_a_sixty_percent_two_to_one_history() {
        let mut trades = Vec::new();
        for day in 1..=12 {
            trades.push(trade("A", 2024, 1, day, dec!(20)));
        }
        for day in 13..=20 {
            trades.push(trade("A", 2024, 1, day, dec!(-10)));
        }
        let kelly = kelly_criterion(&Tally::of(&trades).unwrap()).unwrap().unwrap();

        // W = 0.6, R = 2: K = 0.6 - 0.4 / 2 = 0.4
        assert_eq!(kelly.win_rate, dec!(0.6));
        assert_eq!(kelly.win_loss_ratio, dec!(2));
        assert_eq!(kelly.kelly_pct, dec!(40));
        assert_eq!(kelly.half_kelly_pct, dec!(20));
    }

    #[test]
    fn kelly_is_floored_at_zero_and_needs_both_sides() {
        let losing: Vec<_> = (1..=20)
            .map(|day| trade("A", 2024, 1, day, if day <= 5 { dec!(1) } else { dec!(-10) }))
            .collect();
        let kelly = kelly_criterion(&Tally::of(&losing).unwrap()).unwrap().unwrap();
        assert_eq!(kelly.kelly_pct, Decimal::ZERO);

        let winners: Vec<_> = (1..=20).map(|day| trade("A", 2024, 1, day, dec!(5))).collect();
        assert_eq!(kelly_criterion(&Tally::of(&winners).unwrap()).unwrap(), None);
    }

    #[test]
    fn breakeven_needs_a_third_at_two_to_one() {
        assert_eq!(required_win_rate(dec!(2)).unwrap(), Decimal::ONE / dec!(3));
        assert_eq!(required_win_rate(dec!(1)).unwrap(), dec!(0.5));
        assert!(required_win_rate(Decimal::ZERO).is_err());
    }

    #[test]
    fn targets_step_out_in_r() {
        let targets = profit_targets(dec!(100), dec!(2), &DEFAULT_R_MULTIPLES).unwrap();
        let prices: Vec<(Decimal, Decimal)> =
            targets.iter().map(|t| (t.long_target, t.short_target)).collect();
        assert_eq!(
            prices,
            vec![
                (dec!(102), dec!(98)),
                (dec!(104), dec!(96)),
                (dec!(106), dec!(94)),
                (dec!(110), dec!(90)),
            ]
        );
    }

    #[test]
    fn ruin_needs_the_whole_losing_run() {
        // 50% drawdown at 25% per trade is two straight losses: 0.5 ^ 2.
        let ruin = risk_of_ruin(dec!(25), dec!(0.5)).unwrap();
        assert_eq!(ruin.losses_to_ruin, dec!(2));
        assert!((ruin.ruin_pct - dec!(25)).abs() < dec!(0.0001));

        assert_eq!(risk_of_ruin(dec!(1), Decimal::ONE).unwrap().ruin_pct, Decimal::ZERO);
        assert!(risk_of_ruin(dec!(1), dec!(1.5)).is_err());
    }
}
