use analytics::{
    Alert, AlertKind, AvoidedSummary, DailyPnl, DrawdownPoint, EquityPoint, GroupStats,
    KellyCriterion, MistakeCount, MonthlyPnl, PerformanceReport, PositionSize, ProfitTarget,
    RiskOfRuin, RiskReward, ScoreAttribute, ScoreSplit, Severity,
};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use configuration::OutputFormat;
use core_types::Currency;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

/// Prints reports to stdout as either a table or pretty JSON.
pub struct Output {
    format: OutputFormat,
    currency: Currency,
}

impl Output {
    pub fn new(format: OutputFormat, currency: Currency) -> Self {
        Self { format, currency }
    }

    /// Serializes `value` in JSON mode; otherwise renders the table built by `table`.
    pub fn emit<T, F>(&self, value: &T, table: F) -> anyhow::Result<()>
    where
        T: Serialize,
        F: FnOnce(Currency) -> Table,
    {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Table => println!("{}", table(self.currency)),
        }
        Ok(())
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// `-$12.50` style amounts, rounded to cents.
pub fn money(currency: Currency, value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded.is_zero() {
        return format!("{}0.00", currency.symbol());
    }
    if rounded < Decimal::ZERO {
        format!("-{}{:.2}", currency.symbol(), rounded.abs())
    } else {
        format!("{}{:.2}", currency.symbol(), rounded)
    }
}

/// A value that is already in percent, e.g. `12.5` for 12.5%.
pub fn pct(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

pub fn percent(fraction: Option<Decimal>) -> String {
    match fraction {
        Some(f) => format!("{:.2}%", (f * Decimal::ONE_HUNDRED).round_dp(2)),
        None => "n/a".to_string(),
    }
}

pub fn ratio(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}", v.round_dp(2)),
        None => "n/a".to_string(),
    }
}

pub fn holding_period(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

pub fn summary_table(report: &PerformanceReport, avoided: &AvoidedSummary, currency: Currency) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    let rows = [
        ("Total PnL", money(currency, report.total_pnl)),
        ("Gross profit", money(currency, report.gross_profit)),
        ("Gross loss", money(currency, report.gross_loss)),
        ("Profit factor", ratio(report.profit_factor)),
        ("Expectancy", report.expectancy.map_or("n/a".to_string(), |e| money(currency, e))),
        ("Expectancy (R)", ratio(report.expectancy_r)),
        ("Max drawdown", money(currency, report.max_drawdown)),
        ("Max drawdown %", report.max_drawdown_pct.map_or("n/a".to_string(), pct)),
        ("Sharpe ratio", ratio(report.sharpe_ratio)),
        ("Trades", report.total_trades.to_string()),
        (
            "Wins / losses / breakeven",
            format!(
                "{} / {} / {}",
                report.winning_trades, report.losing_trades, report.breakeven_trades
            ),
        ),
        ("Win rate", percent(report.win_rate)),
        ("Average win", money(currency, report.average_win)),
        ("Average loss", money(currency, report.average_loss)),
        ("Largest win", money(currency, report.largest_win)),
        ("Largest loss", money(currency, report.largest_loss)),
        ("Longest win streak", report.max_consecutive_wins.to_string()),
        ("Longest loss streak", report.max_consecutive_losses.to_string()),
        ("Average holding period", holding_period(report.average_holding_period)),
        ("Avoided trades", avoided.count.to_string()),
        ("Avoided losses", money(currency, avoided.potential_loss)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), right(value)]);
    }
    table
}

pub fn equity_table(equity: &[EquityPoint], drawdown: &[DrawdownPoint], currency: Currency) -> Table {
    let mut table = new_table(&["Date", "Time", "PnL", "Cumulative", "Drawdown"]);
    for (point, dd) in equity.iter().zip(drawdown) {
        table.add_row(vec![
            Cell::new(point.date),
            Cell::new(point.time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default()),
            right(money(currency, point.pnl)),
            right(money(currency, point.cumulative)),
            right(money(currency, dd.drawdown)),
        ]);
    }
    table
}

pub fn groups_table(key_header: &str, groups: &[GroupStats], currency: Currency) -> Table {
    let mut table = new_table(&[key_header, "Trades", "Win rate", "Total PnL", "Average PnL", "Average R"]);
    for group in groups {
        table.add_row(vec![
            Cell::new(&group.key),
            right(group.trades.to_string()),
            right(percent(group.win_rate)),
            right(money(currency, group.total_pnl)),
            right(money(currency, group.average_pnl)),
            right(ratio(group.average_r)),
        ]);
    }
    table
}

pub fn daily_table(days: &[DailyPnl], currency: Currency) -> Table {
    let mut table = new_table(&["Date", "Weekday", "Trades", "PnL"]);
    for day in days {
        table.add_row(vec![
            Cell::new(day.date),
            Cell::new(day.date.format("%A")),
            right(day.trades.to_string()),
            right(money(currency, day.pnl)),
        ]);
    }
    table
}

pub fn monthly_table(months: &[MonthlyPnl], currency: Currency) -> Table {
    let mut table = new_table(&["Month", "Trades", "Win rate", "PnL"]);
    for month in months {
        table.add_row(vec![
            Cell::new(format!("{}-{:02}", month.year, month.month)),
            right(month.trades.to_string()),
            right(percent(month.win_rate)),
            right(money(currency, month.pnl)),
        ]);
    }
    table
}

pub fn mistakes_table(mistakes: &[MistakeCount]) -> Table {
    let mut table = new_table(&["Mistake", "Count"]);
    for mistake in mistakes {
        table.add_row(vec![Cell::new(&mistake.mistake_type), right(mistake.count.to_string())]);
    }
    table
}

pub fn correlation_table(score: ScoreAttribute, correlation: Option<Decimal>) -> Table {
    let mut table = new_table(&["Score", "Correlation with PnL"]);
    table.add_row(vec![Cell::new(score), right(ratio(correlation))]);
    table
}

pub fn psychology_table(insights: &[ScoreSplit], currency: Currency) -> Table {
    let mut table = new_table(&["Score", "Correlation", "High (4-5)", "Low (1-2)", "Difference"]);
    let average = |value: Option<Decimal>, trades: usize| match value {
        Some(v) => format!("{} ({trades})", money(currency, v)),
        None => "n/a".to_string(),
    };
    for split in insights {
        table.add_row(vec![
            Cell::new(split.score),
            right(ratio(split.correlation)),
            right(average(split.high_average_pnl, split.high_trades)),
            right(average(split.low_average_pnl, split.low_trades)),
            right(split.difference.map_or("n/a".to_string(), |d| money(currency, d))),
        ]);
    }
    table
}

pub fn kelly_table(kelly: Option<&KellyCriterion>, currency: Currency) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    let Some(kelly) = kelly else {
        table.add_row(vec![
            Cell::new("Kelly criterion"),
            right(format!("n/a (needs {} trades with wins and losses)", analytics::risk::KELLY_MIN_TRADES)),
        ]);
        return table;
    };
    let rows = [
        ("Kelly", pct(kelly.kelly_pct)),
        ("Half Kelly (suggested risk per trade)", pct(kelly.half_kelly_pct)),
        ("Win rate", percent(Some(kelly.win_rate))),
        ("Average win", money(currency, kelly.average_win)),
        ("Average loss", money(currency, kelly.average_loss)),
        ("Win/loss ratio", ratio(Some(kelly.win_loss_ratio))),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), right(value)]);
    }
    table
}

pub fn position_size_table(size: &PositionSize, currency: Currency) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    let rows = [
        ("Units", format!("{:.2}", size.units.round_dp(2))),
        ("Position value", money(currency, size.position_value)),
        ("Risk amount", money(currency, size.risk_amount)),
        ("Risk", pct(size.risk_pct)),
        ("Stop distance", money(currency, size.stop_distance)),
        ("Leverage", ratio(Some(size.leverage))),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), right(value)]);
    }
    table
}

pub fn risk_reward_table(rr: &RiskReward, currency: Currency) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    let rows = [
        ("Risk", format!("{} ({})", money(currency, rr.risk), pct(rr.risk_pct))),
        ("Reward", format!("{} ({})", money(currency, rr.reward), pct(rr.reward_pct))),
        ("Reward : risk", format!("{}:1", ratio(Some(rr.ratio)))),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), right(value)]);
    }
    table
}

pub fn required_win_rate_table(ratio_value: Decimal, win_rate: Decimal) -> Table {
    let mut table = new_table(&["Reward : risk", "Break-even win rate"]);
    table.add_row(vec![
        right(format!("{}:1", ratio(Some(ratio_value)))),
        right(percent(Some(win_rate))),
    ]);
    table
}

pub fn targets_table(targets: &[ProfitTarget], currency: Currency) -> Table {
    let mut table = new_table(&["R", "Move", "Long target", "Short target"]);
    for target in targets {
        table.add_row(vec![
            right(format!("{}R", target.r_multiple.normalize())),
            right(money(currency, target.profit)),
            right(money(currency, target.long_target)),
            right(money(currency, target.short_target)),
        ]);
    }
    table
}

pub fn ruin_table(ruin: &RiskOfRuin) -> Table {
    let mut table = new_table(&["Metric", "Value"]);
    let rows = [
        ("Risk per trade", pct(ruin.risk_per_trade_pct)),
        ("Win rate", percent(Some(ruin.win_rate))),
        ("Straight losses to a 50% drawdown", format!("{:.0}", ruin.losses_to_ruin.round_dp(0))),
        ("Risk of ruin", format!("{:.4}%", ruin.ruin_pct.round_dp(4))),
    ];
    for (metric, value) in rows {
        table.add_row(vec![Cell::new(metric), right(value)]);
    }
    table
}

pub fn alert_message(alert: &Alert, currency: Currency) -> String {
    match &alert.kind {
        AlertKind::MaxDrawdown { drawdown, drawdown_pct, threshold_pct } => format!(
            "Drawdown reached {} ({}), above the {} limit",
            pct(*drawdown_pct),
            money(currency, *drawdown),
            pct(*threshold_pct)
        ),
        AlertKind::DailyLoss { date, loss, trades, limit } => format!(
            "Lost {} over {trades} trades on {date} (limit {})",
            money(currency, *loss),
            money(currency, *limit)
        ),
        AlertKind::ConsecutiveLosses { count, total_loss, active } => format!(
            "{count} consecutive losses totalling {}{}",
            money(currency, *total_loss),
            if *active { ", still running" } else { "" }
        ),
        AlertKind::WinRateDrop { overall, recent, drop_pct } => format!(
            "Recent win rate {} vs overall {} ({} points lower)",
            percent(Some(*recent)),
            percent(Some(*overall)),
            ratio(Some(*drop_pct))
        ),
        AlertKind::Overtrading { date, trades, pnl, limit } => format!(
            "{trades} trades on {date} (limit {limit}), PnL {}",
            money(currency, *pnl)
        ),
        AlertKind::HighRisk { oversized_trades, average_risk_pct, threshold_pct } => format!(
            "{oversized_trades} recent trades moved more than {} of the account (average {})",
            pct(*threshold_pct),
            pct(*average_risk_pct)
        ),
        AlertKind::RevengeTrading { days } => format!(
            "{days} day(s) opened with a loss followed by more losing trades"
        ),
    }
}

pub fn alerts_table(alerts: &[Alert], currency: Currency) -> Table {
    let mut table = new_table(&["Severity", "Alert"]);
    if alerts.is_empty() {
        table.add_row(vec![Cell::new("ok"), Cell::new("No active alerts")]);
    }
    for alert in alerts {
        let severity = match alert.severity {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
        };
        table.add_row(vec![Cell::new(severity), Cell::new(alert_message(alert, currency))]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn money_rounds_to_cents_and_puts_the_sign_first() {
        assert_eq!(money(Currency::Dollar, dec!(70)), "$70.00");
        assert_eq!(money(Currency::Euro, dec!(-12.344)), "-€12.34");
        assert_eq!(money(Currency::Dollar, dec!(-0.001)), "$0.00");
    }

    #[test]
    fn percentages_and_missing_ratios() {
        assert_eq!(percent(Some(dec!(0.5))), "50.00%");
        assert_eq!(percent(None), "n/a");
        assert_eq!(ratio(Some(dec!(1.256))), "1.26");
    }

    #[test]
    fn holding_periods_read_naturally() {
        assert_eq!(holding_period(Duration::from_secs(45)), "45s");
        assert_eq!(holding_period(Duration::from_secs(17 * 60 + 30)), "17m 30s");
        assert_eq!(holding_period(Duration::from_secs(2 * 3600 + 5 * 60)), "2h 5m");
        assert_eq!(holding_period(Duration::ZERO), "0s");
    }

    #[test]
    fn alerts_render_one_row_each_or_an_all_clear() {
        let alerts = vec![Alert {
            severity: Severity::Critical,
            kind: AlertKind::ConsecutiveLosses { count: 3, total_loss: dec!(45), active: true },
        }];
        let table = alerts_table(&alerts, Currency::Dollar);
        assert_eq!(table.row_iter().count(), 1);
        assert_eq!(
            alert_message(&alerts[0], Currency::Dollar),
            "3 consecutive losses totalling $45.00, still running"
        );
        assert!(alerts_table(&[], Currency::Dollar).to_string().contains("No active alerts"));
    }

    #[test]
    fn tables_have_one_row_per_group() {
        let groups = vec![GroupStats {
            key: "AAPL".to_string(),
            trades: 2,
            wins: 2,
            losses: 0,
            breakeven: 0,
            win_rate: Some(Decimal::ONE),
            total_pnl: dec!(60),
            average_pnl: dec!(30),
            average_r: None,
        }];
        let table = groups_table("Symbol", &groups, Currency::Dollar);
        assert_eq!(table.row_iter().count(), 1);
        assert!(table.to_string().contains("$60.00"));
    }
}
