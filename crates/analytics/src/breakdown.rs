use crate::error::AnalyticsError;
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use core_types::Trade;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Running counters for a group of trades.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tally {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub r_sum: Decimal,
    pub r_count: usize,
}

impl Tally {
    pub fn add(&mut self, trade: &Trade) -> Result<(), AnalyticsError> {
        self.trades += 1;
        self.total_pnl = checked_add(self.total_pnl, trade.pnl, "total pnl")?;
        if trade.is_win() {
            self.wins += 1;
            self.gross_profit = checked_add(self.gross_profit, trade.pnl, "gross profit")?;
        } else if trade.is_loss() {
            self.losses += 1;
            self.gross_loss = checked_add(self.gross_loss, trade.pnl.abs(), "gross loss")?;
        } else {
            self.breakeven += 1;
        }
        if let Some(r) = trade.r_multiple {
            self.r_sum = checked_add(self.r_sum, r, "r-multiple sum")?;
            self.r_count += 1;
        }
        Ok(())
    }

    pub fn of<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Result<Self, AnalyticsError> {
        let mut tally = Tally::default();
        for t in trades {
            tally.add(t)?;
        }
        Ok(tally)
    }

    /// Wins over decisive trades. Breakeven trades count on neither side.
    pub fn win_rate(&self) -> Option<Decimal> {
        let decisive = self.wins + self.losses;
        (decisive > 0).then(|| Decimal::from(self.wins) / Decimal::from(decisive))
    }

    pub fn average_pnl(&self) -> Option<Decimal> {
        (self.trades > 0).then(|| self.total_pnl / Decimal::from(self.trades))
    }

    /// Mean over the trades that carry an R-multiple; the others are left out.
    pub fn average_r(&self) -> Option<Decimal> {
        (self.r_count > 0).then(|| self.r_sum / Decimal::from(self.r_count))
    }

    fn into_stats(self, key: String) -> GroupStats {
        GroupStats {
            win_rate: self.win_rate(),
            average_pnl: self.average_pnl().unwrap_or_default(),
            average_r: self.average_r(),
            key,
            trades: self.trades,
            wins: self.wins,
            losses: self.losses,
            breakeven: self.breakeven,
            total_pnl: self.total_pnl,
        }
    }
}

/// Aggregate figures for one value of a grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate: Option<Decimal>,
    pub total_pnl: Decimal,
    pub average_pnl: Decimal,
    pub average_r: Option<Decimal>,
}

/// A trade attribute that trades can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAttribute {
    Symbol,
    Setup,
    Mood,
    Influence,
    MarketCondition,
    TradeType,
    Side,
    FocusLevel,
    StressLevel,
    SleepQuality,
    Confidence,
}

impl GroupAttribute {
    pub const ALL: [GroupAttribute; 11] = [
        GroupAttribute::Symbol,
        GroupAttribute::Setup,
        GroupAttribute::Mood,
        GroupAttribute::Influence,
        GroupAttribute::MarketCondition,
        GroupAttribute::TradeType,
        GroupAttribute::Side,
        GroupAttribute::FocusLevel,
        GroupAttribute::StressLevel,
        GroupAttribute::SleepQuality,
        GroupAttribute::Confidence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GroupAttribute::Symbol => "symbol",
            GroupAttribute::Setup => "setup",
            GroupAttribute::Mood => "mood",
            GroupAttribute::Influence => "influence",
            GroupAttribute::MarketCondition => "market_condition",
            GroupAttribute::TradeType => "trade_type",
            GroupAttribute::Side => "side",
            GroupAttribute::FocusLevel => "focus_level",
            GroupAttribute::StressLevel => "stress_level",
            GroupAttribute::SleepQuality => "sleep_quality",
            GroupAttribute::Confidence => "confidence",
        }
    }

    /// The group a trade falls into. Blank labels are collected under "(none)".
    ///
    /// Symbols compare case-insensitively, so "aapl" and "AAPL" share a group.
    pub fn key(&self, trade: &Trade) -> String {
        let label = match self {
            GroupAttribute::Symbol => {
                let symbol = trade.symbol.trim().to_uppercase();
                return if symbol.is_empty() { "(none)".to_string() } else { symbol };
            }
            GroupAttribute::Setup => trade.setup.as_str(),
            GroupAttribute::Mood => trade.mood.as_str(),
            GroupAttribute::Influence => trade.influence.as_str(),
            GroupAttribute::MarketCondition => trade.market_condition.as_str(),
            GroupAttribute::TradeType => trade.trade_type.as_str(),
            GroupAttribute::Side => trade.side.as_str(),
            GroupAttribute::FocusLevel => return trade.focus_level.to_string(),
            GroupAttribute::StressLevel => return trade.stress_level.to_string(),
            GroupAttribute::SleepQuality => return trade.sleep_quality.to_string(),
            GroupAttribute::Confidence => return trade.confidence.to_string(),
        };
        let label = label.trim();
        if label.is_empty() {
            "(none)".to_string()
        } else {
            label.to_string()
        }
    }
}

impl fmt::Display for GroupAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupAttribute {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let attribute = match normalized.as_str() {
            "symbol" => GroupAttribute::Symbol,
            "setup" | "strategy" => GroupAttribute::Setup,
            "mood" => GroupAttribute::Mood,
            "influence" | "reason" => GroupAttribute::Influence,
            "market_condition" | "market" => GroupAttribute::MarketCondition,
            "trade_type" => GroupAttribute::TradeType,
            "side" => GroupAttribute::Side,
            "focus" | "focus_level" => GroupAttribute::FocusLevel,
            "stress" | "stress_level" => GroupAttribute::StressLevel,
            "sleep" | "sleep_quality" => GroupAttribute::SleepQuality,
            "confidence" | "pre_trade_confidence" => GroupAttribute::Confidence,
            _ => return Err(AnalyticsError::UnknownAttribute(s.to_string())),
        };
        Ok(attribute)
    }
}

/// A 1..=5 psychology score that can be correlated with PnL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAttribute {
    FocusLevel,
    StressLevel,
    SleepQuality,
    Confidence,
}

impl ScoreAttribute {
    pub const ALL: [ScoreAttribute; 4] = [
        ScoreAttribute::FocusLevel,
        ScoreAttribute::StressLevel,
        ScoreAttribute::SleepQuality,
        ScoreAttribute::Confidence,
    ];

    pub fn value(&self, trade: &Trade) -> u8 {
        match self {
            ScoreAttribute::FocusLevel => trade.focus_level,
            ScoreAttribute::StressLevel => trade.stress_level,
            ScoreAttribute::SleepQuality => trade.sleep_quality,
            ScoreAttribute::Confidence => trade.confidence,
        }
    }

    pub fn name(&self) -> &'static str {
        GroupAttribute::from(*self).name()
    }
}

impl From<ScoreAttribute> for GroupAttribute {
    fn from(score: ScoreAttribute) -> Self {
        match score {
            ScoreAttribute::FocusLevel => GroupAttribute::FocusLevel,
            ScoreAttribute::StressLevel => GroupAttribute::StressLevel,
            ScoreAttribute::SleepQuality => GroupAttribute::SleepQuality,
            ScoreAttribute::Confidence => GroupAttribute::Confidence,
        }
    }
}

impl fmt::Display for ScoreAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScoreAttribute {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<GroupAttribute>()? {
            GroupAttribute::FocusLevel => Ok(ScoreAttribute::FocusLevel),
            GroupAttribute::StressLevel => Ok(ScoreAttribute::StressLevel),
            GroupAttribute::SleepQuality => Ok(ScoreAttribute::SleepQuality),
            GroupAttribute::Confidence => Ok(ScoreAttribute::Confidence),
            _ => Err(AnalyticsError::UnknownAttribute(s.to_string())),
        }
    }
}

/// PnL summed per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub pnl: Decimal,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPnl {
    pub year: i32,
    pub month: u32,
    pub pnl: Decimal,
    pub trades: usize,
    pub win_rate: Option<Decimal>,
}

/// Scores at or above this count as "high".
pub const HIGH_SCORE_MIN: u8 = 4;
/// Scores at or below this count as "low".
pub const LOW_SCORE_MAX: u8 = 2;

/// How PnL differs between trades taken with a high and a low value of one score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSplit {
    pub score: ScoreAttribute,
    pub correlation: Option<Decimal>,
    pub high_trades: usize,
    pub high_average_pnl: Option<Decimal>,
    pub low_trades: usize,
    pub low_average_pnl: Option<Decimal>,
    /// High average minus low average; None unless both sides have trades.
    pub difference: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeCount {
    pub mistake_type: String,
    pub count: usize,
}

pub(crate) fn checked_add(a: Decimal, b: Decimal, quantity: &str) -> Result<Decimal, AnalyticsError> {
    a.checked_add(b).ok_or_else(|| AnalyticsError::overflow(quantity))
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal, quantity: &str) -> Result<Decimal, AnalyticsError> {
    a.checked_mul(b).ok_or_else(|| AnalyticsError::overflow(quantity))
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal, quantity: &str) -> Result<Decimal, AnalyticsError> {
    a.checked_sub(b).ok_or_else(|| AnalyticsError::overflow(quantity))
}

/// Sum of PnL over `trades`.
pub(crate) fn pnl_sum<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Result<Decimal, AnalyticsError> {
    trades
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, t| checked_add(acc, t.pnl, "pnl sum"))
}

/// Groups by `key`, sorted by total PnL descending with ties broken by key.
pub(crate) fn group_by_total<F>(trades: &[&Trade], key: F) -> Result<Vec<GroupStats>, AnalyticsError>
where
    F: Fn(&Trade) -> String,
{
    let mut groups = collect_groups(trades, key)?;
    groups.sort_by(|a, b| b.total_pnl.cmp(&a.total_pnl).then_with(|| a.key.cmp(&b.key)));
    Ok(groups)
}

/// Groups by `key`, sorted by average PnL descending with ties broken by key.
pub(crate) fn group_by_average<F>(trades: &[&Trade], key: F) -> Result<Vec<GroupStats>, AnalyticsError>
where
    F: Fn(&Trade) -> String,
{
    let mut groups = collect_groups(trades, key)?;
    groups.sort_by(|a, b| {
        b.average_pnl
            .cmp(&a.average_pnl)
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(groups)
}

fn collect_groups<F>(trades: &[&Trade], key: F) -> Result<Vec<GroupStats>, AnalyticsError>
where
    F: Fn(&Trade) -> String,
{
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for t in trades {
        tallies.entry(key(t)).or_default().add(t)?;
    }
    Ok(tallies
        .into_iter()
        .map(|(key, tally)| tally.into_stats(key))
        .collect())
}

pub(crate) fn daily(trades: &[&Trade]) -> Result<Vec<DailyPnl>, AnalyticsError> {
    let mut days: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for t in trades {
        let day = days.entry(t.date).or_default();
        day.0 = checked_add(day.0, t.pnl, "daily pnl")?;
        day.1 += 1;
    }
    Ok(days
        .into_iter()
        .map(|(date, (pnl, trades))| DailyPnl { date, pnl, trades })
        .collect())
}

pub(crate) fn monthly(trades: &[&Trade]) -> Result<Vec<MonthlyPnl>, AnalyticsError> {
    let mut months: BTreeMap<(i32, u32), Tally> = BTreeMap::new();
    for t in trades {
        months.entry((t.date.year(), t.date.month())).or_default().add(t)?;
    }
    Ok(months
        .into_iter()
        .map(|((year, month), tally)| MonthlyPnl {
            year,
            month,
            pnl: tally.total_pnl,
            trades: tally.trades,
            win_rate: tally.win_rate(),
        })
        .collect())
}

/// Monday first; days without trades are left out.
pub(crate) fn weekdays(trades: &[&Trade]) -> Result<Vec<GroupStats>, AnalyticsError> {
    let mut days: BTreeMap<u32, (Weekday, Tally)> = BTreeMap::new();
    for t in trades {
        let weekday = t.date.weekday();
        days.entry(weekday.num_days_from_monday())
            .or_insert_with(|| (weekday, Tally::default()))
            .1
            .add(t)?;
    }
    Ok(days
        .into_values()
        .map(|(weekday, tally)| tally.into_stats(weekday_name(weekday).to_string()))
        .collect())
}

/// Hour of entry, ascending. Trades without a time are skipped.
pub(crate) fn hours(trades: &[&Trade]) -> Result<Vec<GroupStats>, AnalyticsError> {
    let mut hours: BTreeMap<u32, Tally> = BTreeMap::new();
    for t in trades {
        if let Some(time) = t.time {
            hours.entry(time.hour()).or_default().add(t)?;
        }
    }
    Ok(hours
        .into_iter()
        .map(|(hour, tally)| tally.into_stats(format!("{hour:02}:00")))
        .collect())
}

/// Pearson correlation between a score and PnL.
///
/// `None` with fewer than two trades or when either side has no variance.
pub(crate) fn score_correlation(
    trades: &[&Trade],
    score: ScoreAttribute,
) -> Result<Option<Decimal>, AnalyticsError> {
    if trades.len() < 2 {
        return Ok(None);
    }
    let n = Decimal::from(trades.len());
    let xs: Vec<Decimal> = trades.iter().map(|t| Decimal::from(score.value(t))).collect();
    let mean_x = xs.iter().sum::<Decimal>() / n;
    let mean_y = pnl_sum(trades.iter().copied())? / n;

    let (mut cov, mut var_x, mut var_y) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    for (x, t) in xs.iter().zip(trades) {
        let dx = *x - mean_x;
        let dy = checked_sub(t.pnl, mean_y, "pnl deviation")?;
        cov = checked_add(cov, checked_mul(dx, dy, "covariance")?, "covariance")?;
        var_x += dx * dx;
        var_y = checked_add(var_y, checked_mul(dy, dy, "pnl variance")?, "pnl variance")?;
    }
    if var_x.is_zero() || var_y.is_zero() {
        return Ok(None);
    }

    let denominator = checked_mul(var_x, var_y, "correlation denominator")?.sqrt().ok_or_else(|| {
        AnalyticsError::Calculation("Failed to calculate square root for correlation".to_string())
    })?;
    if denominator.is_zero() {
        return Ok(None);
    }
    Ok(Some((cov / denominator).clamp(-Decimal::ONE, Decimal::ONE)))
}

pub(crate) fn score_split(
    trades: &[&Trade],
    score: ScoreAttribute,
) -> Result<ScoreSplit, AnalyticsError> {
    let high = Tally::of(trades.iter().copied().filter(|t| score.value(t) >= HIGH_SCORE_MIN))?;
    let low = Tally::of(trades.iter().copied().filter(|t| score.value(t) <= LOW_SCORE_MAX))?;
    let (high_average_pnl, low_average_pnl) = (high.average_pnl(), low.average_pnl());
    let difference = match (high_average_pnl, low_average_pnl) {
        (Some(h), Some(l)) => Some(checked_sub(h, l, "score split difference")?),
        _ => None,
    };

    Ok(ScoreSplit {
        score,
        correlation: score_correlation(trades, score)?,
        high_trades: high.trades,
        high_average_pnl,
        low_trades: low.trades,
        low_average_pnl,
        difference,
    })
}

/// The best and the worst group by average PnL among groups with at least `min_trades`.
pub fn best_and_worst(groups: &[GroupStats], min_trades: usize) -> Option<(&GroupStats, &GroupStats)> {
    let mut eligible = groups.iter().filter(|g| g.trades >= min_trades);
    let first = eligible.next()?;
    let (best, worst) = eligible.fold((first, first), |(best, worst), g| {
        let best = if g.average_pnl > best.average_pnl { g } else { best };
        let worst = if g.average_pnl < worst.average_pnl { g } else { worst };
        (best, worst)
    });
    Some((best, worst))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, trade};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn tally_keeps_counts_consistent() {
        let trades = vec![
            trade("A", 2024, 1, 1, dec!(10)),
            trade("A", 2024, 1, 1, dec!(0)),
            trade("A", 2024, 1, 1, dec!(-4)),
        ];
        let tally = Tally::of(&trades).unwrap();
        assert_eq!(tally.wins + tally.losses + tally.breakeven, tally.trades);
        assert_eq!(tally.win_rate(), Some(dec!(0.5)));
        assert_eq!(tally.gross_loss, dec!(4));
    }

    #[test]
    fn only_breakeven_has_no_win_rate() {
        let trades = vec![trade("A", 2024, 1, 1, dec!(0))];
        let tally = Tally::of(&trades).unwrap();
        assert_eq!(tally.win_rate(), None);
        assert_eq!(tally.average_pnl(), Some(Decimal::ZERO));
    }

    #[test]
    fn attribute_names_parse() {
        assert_eq!("Mood".parse::<GroupAttribute>().unwrap(), GroupAttribute::Mood);
        assert_eq!("market-condition".parse::<GroupAttribute>().unwrap(), GroupAttribute::MarketCondition);
        assert_eq!("sleep".parse::<ScoreAttribute>().unwrap(), ScoreAttribute::SleepQuality);
        assert_eq!(
            "horoscope".parse::<GroupAttribute>(),
            Err(AnalyticsError::UnknownAttribute("horoscope".to_string()))
        );
        assert!("mood".parse::<ScoreAttribute>().is_err());
    }

    #[test]
    fn blank_labels_share_a_bucket() {
        let mut t = trade("A", 2024, 1, 1, dec!(1));
        t.influence = "  ".to_string();
        assert_eq!(GroupAttribute::Influence.key(&t), "(none)");
    }

    #[test]
    fn symbol_keys_ignore_case_and_padding() {
        let mut t = trade("AAPL", 2024, 1, 1, dec!(1));
        t.symbol = " aapl".to_string();
        assert_eq!(GroupAttribute::Symbol.key(&t), "AAPL");
    }

    #[test]
    fn weekdays_start_on_monday() {
        // 2024-01-07 is a Sunday, 2024-01-08 a Monday.
        let trades = vec![trade("A", 2024, 1, 7, dec!(5)), trade("A", 2024, 1, 8, dec!(-5))];
        let refs: Vec<&Trade> = trades.iter().collect();
        let keys: Vec<String> = weekdays(&refs).unwrap().into_iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["Monday".to_string(), "Sunday".to_string()]);
    }

    #[test]
    fn hours_skip_untimed_trades() {
        let trades = vec![
            at(trade("A", 2024, 1, 1, dec!(5)), 14, 5),
            at(trade("A", 2024, 1, 2, dec!(3)), 9, 45),
            trade("A", 2024, 1, 3, dec!(1)),
        ];
        let refs: Vec<&Trade> = trades.iter().collect();
        let stats = hours(&refs).unwrap();
        let keys: Vec<&str> = stats.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["09:00", "14:00"]);
    }

    #[test]
    fn monthly_groups_by_year_and_month() {
        let trades = vec![
            trade("A", 2024, 2, 1, dec!(5)),
            trade("A", 2024, 1, 31, dec!(-2)),
            trade("A", 2024, 2, 29, dec!(1)),
        ];
        let refs: Vec<&Trade> = trades.iter().collect();
        let months = monthly(&refs).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].month, months[0].pnl), (1, dec!(-2)));
        assert_eq!((months[1].month, months[1].pnl, months[1].trades), (2, dec!(6), 2));
        assert_eq!(months[1].win_rate, Some(Decimal::ONE));
    }

    #[test]
    fn perfectly_linear_scores_correlate_to_one() {
        let trades: Vec<Trade> = (1..=5u8)
            .map(|focus| {
                let mut t = trade("A", 2024, 1, focus as u32, Decimal::from(focus) * dec!(10));
                t.focus_level = focus;
                t
            })
            .collect();
        let refs: Vec<&Trade> = trades.iter().collect();
        let corr = score_correlation(&refs, ScoreAttribute::FocusLevel).unwrap().unwrap();
        assert!((corr - Decimal::ONE).abs() < dec!(0.000001));

        assert_eq!(score_correlation(&refs, ScoreAttribute::StressLevel).unwrap(), None);
    }

    #[test]
    fn correlation_reports_overflow_instead_of_panicking() {
        let mut low = trade("A", 2024, 1, 1, dec!(1));
        low.focus_level = 1;
        let mut high = trade("A", 2024, 1, 2, dec!(100000000000000000));
        high.focus_level = 5;
        let trades = vec![low, high];
        let refs: Vec<&Trade> = trades.iter().collect();
        assert!(matches!(
            score_correlation(&refs, ScoreAttribute::FocusLevel),
            Err(AnalyticsError::Calculation(_))
        ));
    }

    #[test]
    fn daily_sums_fail_cleanly_past_the_decimal_range() {
        let trades = vec![
            trade("A", 2024, 1, 1, dec!(50000000000000000000000000000)),
            trade("A", 2024, 1, 1, dec!(50000000000000000000000000000)),
        ];
        let refs: Vec<&Trade> = trades.iter().collect();
        assert!(matches!(daily(&refs), Err(AnalyticsError::Calculation(_))));
    }

    #[test]
    fn score_split_compares_high_and_low_averages() {
        let scored = |pnl: Decimal, sleep: u8| {
            let mut t = trade("A", 2024, 1, 1, pnl);
            t.sleep_quality = sleep;
            t
        };
        let trades = vec![
            scored(dec!(30), 5),
            scored(dec!(10), 4),
            scored(dec!(50), 3),
            scored(dec!(-20), 1),
        ];
        let refs: Vec<&Trade> = trades.iter().collect();
        let split = score_split(&refs, ScoreAttribute::SleepQuality).unwrap();

        assert_eq!((split.high_trades, split.low_trades), (2, 1));
        assert_eq!(split.high_average_pnl, Some(dec!(20)));
        assert_eq!(split.low_average_pnl, Some(dec!(-20)));
        assert_eq!(split.difference, Some(dec!(40)));
        assert!(split.correlation.is_some());

        let no_low = score_split(&refs[..2], ScoreAttribute::SleepQuality).unwrap();
        assert_eq!((no_low.low_average_pnl, no_low.difference), (None, None));
    }

    #[test]
    fn best_and_worst_respects_minimum() {
        let groups = vec![
            GroupStats {
                key: "thin".into(),
                trades: 1,
                wins: 1,
                losses: 0,
                breakeven: 0,
                win_rate: Some(Decimal::ONE),
                total_pnl: dec!(500),
                average_pnl: dec!(500),
                average_r: None,
            },
            GroupStats {
                key: "solid".into(),
                trades: 4,
                wins: 3,
                losses: 1,
                breakeven: 0,
                win_rate: Some(dec!(0.75)),
                total_pnl: dec!(40),
                average_pnl: dec!(10),
                average_r: None,
            },
            GroupStats {
                key: "weak".into(),
                trades: 3,
                wins: 0,
                losses: 3,
                breakeven: 0,
                win_rate: Some(Decimal::ZERO),
                total_pnl: dec!(-30),
                average_pnl: dec!(-10),
                average_r: None,
            },
        ];
        let (best, worst) = best_and_worst(&groups, 3).unwrap();
        assert_eq!((best.key.as_str(), worst.key.as_str()), ("solid", "weak"));
        assert!(best_and_worst(&groups, 10).is_none());
    }
}
