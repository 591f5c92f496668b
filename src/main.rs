use analytics::{
    AnalyticsEngine, AvoidedSummary, DrawdownPoint, EquityPoint, GroupAttribute, GroupStats,
    PerformanceReport, ScoreAttribute, TradeFilter, best_and_worst, risk,
};
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use configuration::{Config, OutputFormat};
use core_types::UserId;
use journal::Journal;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod output;

use output::Output;

/// The main entry point for the tradelog journal analyzer.
fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; overrides can also come from the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    // Held until exit so the file writer can flush.
    let _log_guard =
        configuration::logging::init(&config.logging).context("Failed to initialize logging")?;

    let output = Output::new(cli.format.unwrap_or(config.display.format), config.display.currency);

    // The calculators work on their arguments alone.
    if let Commands::Risk { calculator } = cli.command {
        return run_calculator(calculator, &output);
    }

    let journal = read_journal(cli.input.as_deref())?;
    tracing::info!(trades = journal.trades().len(), command = ?cli.command, "Journal ready.");

    run(cli.command, &journal, &cli.filter.to_filter(), &config, &output)
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance analytics for a trading journal export.
#[derive(Parser, Debug)]
#[command(name = "tradelog", author, version, about, long_about = None)]
struct Cli {
    /// A TOML config file. Defaults to ./tradelog.toml when it exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// The journal JSON export to analyze. Read from stdin when omitted.
    #[arg(long, short, global = true)]
    input: Option<PathBuf>,

    /// Overrides `display.format` from the config.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only trades of this user.
    #[arg(long, global = true)]
    user: Option<UserId>,

    /// Only trades booked to this account id.
    #[arg(long, global = true)]
    account: Option<Uuid>,

    /// The first date to include (format: YYYY-MM-DD).
    #[arg(long, global = true)]
    from: Option<NaiveDate>,

    /// The last date to include (format: YYYY-MM-DD).
    #[arg(long, global = true)]
    to: Option<NaiveDate>,

    /// Only trades in this symbol (case-insensitive).
    #[arg(long, global = true)]
    symbol: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> TradeFilter {
        TradeFilter {
            user_id: self.user,
            account_id: self.account,
            from: self.from,
            to: self.to,
            symbol: self.symbol.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Headline performance metrics.
    Summary,
    /// Cumulative PnL after every trade, with the drawdown from the running peak.
    Equity,
    /// Per-symbol statistics, best total first.
    Symbols,
    /// Daily PnL for one month. Defaults to the month of the latest trade.
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// PnL and win rate per calendar month.
    Monthly,
    /// Statistics per weekday, Monday first.
    Weekdays,
    /// Statistics per hour of entry.
    Hours,
    /// Win rate and average PnL per value of a trade attribute (e.g. mood, setup, focus_level).
    Groups {
        #[arg(long)]
        by: GroupAttribute,
    },
    /// Pearson correlation between a psychology score and PnL.
    Correlate {
        #[arg(long)]
        score: ScoreAttribute,
    },
    /// How often each mistake type was logged.
    Mistakes,
    /// Average PnL on high (4-5) versus low (1-2) days for every psychology score.
    Psychology,
    /// Kelly position sizing from the trade history.
    Kelly,
    /// Risk warnings: drawdown, daily loss, losing streaks, overtrading, revenge trading.
    Alerts {
        /// The day checked for daily loss and overtrading. Defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Trade planning calculators. These do not read a journal.
    Risk {
        #[command(subcommand)]
        calculator: RiskCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RiskCommand {
    /// Units to buy so that hitting the stop loses `--risk-pct` of the balance.
    PositionSize {
        #[arg(long)]
        balance: Decimal,
        /// Percent of the balance to risk, e.g. 1 for 1%.
        #[arg(long)]
        risk_pct: Decimal,
        #[arg(long)]
        entry: Decimal,
        #[arg(long)]
        stop: Decimal,
    },
    /// Reward-to-risk ratio of a planned trade.
    RiskReward {
        #[arg(long)]
        entry: Decimal,
        #[arg(long)]
        stop: Decimal,
        #[arg(long)]
        target: Decimal,
    },
    /// The win rate needed to break even at a reward-to-risk ratio.
    RequiredWinRate {
        #[arg(long)]
        ratio: Decimal,
    },
    /// Exit prices at multiples of the per-unit risk.
    Targets {
        #[arg(long)]
        entry: Decimal,
        /// Price distance between entry and stop.
        #[arg(long)]
        risk: Decimal,
        /// Comma-separated R multiples. Defaults to 1,2,3,5.
        #[arg(long = "r", value_delimiter = ',')]
        r_multiples: Vec<Decimal>,
    },
    /// Chance of a losing run that halves the account.
    Ruin {
        /// Percent of the account risked per trade.
        #[arg(long)]
        risk_pct: Decimal,
        /// Win rate as a fraction, e.g. 0.55.
        #[arg(long)]
        win_rate: Decimal,
    },
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn read_journal(path: Option<&Path>) -> anyhow::Result<Journal> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read journal from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read journal from stdin")?;
            buffer
        }
    };
    Journal::from_json_str(&json).context("Failed to parse journal document")
}

#[derive(Serialize)]
struct SummaryView<'a> {
    summary: &'a PerformanceReport,
    avoided: &'a AvoidedSummary,
}

#[derive(Serialize)]
struct EquityView<'a> {
    equity_curve: &'a [EquityPoint],
    drawdown: &'a [DrawdownPoint],
}

#[derive(Serialize)]
struct GroupsView<'a> {
    attribute: GroupAttribute,
    groups: &'a [GroupStats],
    best: Option<&'a GroupStats>,
    worst: Option<&'a GroupStats>,
}

#[derive(Serialize)]
struct CorrelationView {
    score: ScoreAttribute,
    correlation: Option<Decimal>,
}

#[derive(Serialize)]
struct RequiredWinRateView {
    ratio: Decimal,
    required_win_rate: Decimal,
}

fn run(
    command: Commands,
    journal: &Journal,
    filter: &TradeFilter,
    config: &Config,
    output: &Output,
) -> anyhow::Result<()> {
    let engine =
        AnalyticsEngine::new().with_annualization_days(config.analytics.annualization_days);
    let trades = journal.trades();

    match command {
        Commands::Summary => {
            let report = engine.summarize(trades, filter)?;
            let avoided = engine.avoided_summary(journal.avoided_trades().as_slice(), filter)?;
            let view = SummaryView { summary: &report, avoided: &avoided };
            output.emit(&view, |currency| output::summary_table(&report, &avoided, currency))
        }
        Commands::Equity => {
            let equity = engine.equity_curve(trades, filter)?;
            let drawdown = engine.drawdown_curve(trades, filter)?;
            let view = EquityView { equity_curve: &equity, drawdown: &drawdown };
            output.emit(&view, |currency| output::equity_table(&equity, &drawdown, currency))
        }
        Commands::Symbols => {
            let symbols = engine.by_symbol(trades, filter)?;
            output.emit(&symbols, |currency| output::groups_table("Symbol", &symbols, currency))
        }
        Commands::Calendar { year, month } => {
            let (year, month) = calendar_month(journal, filter, year, month);
            let days = engine.calendar_month(trades, filter, year, month)?;
            output.emit(&days, |currency| output::daily_table(&days, currency))
        }
        Commands::Monthly => {
            let months = engine.by_month(trades, filter)?;
            output.emit(&months, |currency| output::monthly_table(&months, currency))
        }
        Commands::Weekdays => {
            let days = engine.by_weekday(trades, filter)?;
            output.emit(&days, |currency| output::groups_table("Weekday", &days, currency))
        }
        Commands::Hours => {
            let hours = engine.by_hour(trades, filter)?;
            output.emit(&hours, |currency| output::groups_table("Hour", &hours, currency))
        }
        Commands::Groups { by } => {
            let groups = engine.by_attribute(trades, filter, by)?;
            let extremes = best_and_worst(&groups, config.analytics.min_group_trades);
            let view = GroupsView {
                attribute: by,
                groups: &groups,
                best: extremes.map(|(best, _)| best),
                worst: extremes.map(|(_, worst)| worst),
            };
            output.emit(&view, |currency| {
                let mut table = output::groups_table(&by.to_string(), &groups, currency);
                if let Some((best, worst)) = extremes {
                    table.add_row(vec![format!("Best: {}", best.key), format!("Worst: {}", worst.key)]);
                }
                table
            })
        }
        Commands::Correlate { score } => {
            let correlation = engine.score_correlation(trades, filter, score)?;
            let view = CorrelationView { score, correlation };
            output.emit(&view, |_| output::correlation_table(score, correlation))
        }
        Commands::Mistakes => {
            let mistakes = engine.mistake_frequency(journal.mistakes().as_slice(), filter)?;
            output.emit(&mistakes, |_| output::mistakes_table(&mistakes))
        }
        Commands::Psychology => {
            let insights = engine.psychology_insights(trades, filter)?;
            output.emit(&insights, |currency| output::psychology_table(&insights, currency))
        }
        Commands::Kelly => {
            let kelly = engine.kelly_criterion(trades, filter)?;
            output.emit(&kelly, |currency| output::kelly_table(kelly.as_ref(), currency))
        }
        Commands::Alerts { as_of } => {
            let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
            let account_size = alert_account_size(journal, filter)?;
            let alerts = engine.alerts(trades, filter, account_size, &config.alerts, as_of)?;
            if !alerts.is_empty() {
                tracing::warn!(alerts = alerts.len(), %as_of, "Risk alerts triggered.");
            }
            output.emit(&alerts, |currency| output::alerts_table(&alerts, currency))
        }
        Commands::Risk { calculator } => run_calculator(calculator, output),
    }
}

fn run_calculator(calculator: RiskCommand, output: &Output) -> anyhow::Result<()> {
    match calculator {
        RiskCommand::PositionSize { balance, risk_pct, entry, stop } => {
            let size = risk::position_size(balance, risk_pct, entry, stop)?;
            output.emit(&size, |currency| output::position_size_table(&size, currency))
        }
        RiskCommand::RiskReward { entry, stop, target } => {
            let rr = risk::risk_reward(entry, stop, target)?;
            output.emit(&rr, |currency| output::risk_reward_table(&rr, currency))
        }
        RiskCommand::RequiredWinRate { ratio } => {
            let required_win_rate = risk::required_win_rate(ratio)?;
            let view = RequiredWinRateView { ratio, required_win_rate };
            output.emit(&view, |_| output::required_win_rate_table(ratio, required_win_rate))
        }
        RiskCommand::Targets { entry, risk: per_unit, r_multiples } => {
            let r_multiples = if r_multiples.is_empty() {
                risk::DEFAULT_R_MULTIPLES.to_vec()
            } else {
                r_multiples
            };
            let targets = risk::profit_targets(entry, per_unit, &r_multiples)?;
            output.emit(&targets, |currency| output::targets_table(&targets, currency))
        }
        RiskCommand::Ruin { risk_pct, win_rate } => {
            let ruin = risk::risk_of_ruin(risk_pct, win_rate)?;
            output.emit(&ruin, |_| output::ruin_table(&ruin))
        }
    }
}

/// The balance alerts are measured against: the filtered account, else every account of the
/// filtered user (or of the whole journal). `None` when the journal has no matching account.
fn alert_account_size(journal: &Journal, filter: &TradeFilter) -> anyhow::Result<Option<Decimal>> {
    if let Some(id) = filter.account_id {
        return Ok(journal.account(id).map(|account| account.size));
    }
    let mut accounts = journal
        .accounts()
        .iter()
        .filter(|account| filter.user_id.is_none_or(|user| account.user_id == user))
        .peekable();
    if accounts.peek().is_none() {
        return Ok(None);
    }
    accounts
        .try_fold(Decimal::ZERO, |total, account| total.checked_add(account.size))
        .map(Some)
        .context("Combined account size does not fit in a decimal")
}

/// Explicit values win; otherwise the month of the latest filtered trade, then the current month.
fn calendar_month(
    journal: &Journal,
    filter: &TradeFilter,
    year: Option<i32>,
    month: Option<u32>,
) -> (i32, u32) {
    let latest = journal
        .trades()
        .iter()
        .filter(|t| filter.matches(t))
        .map(|t| t.date)
        .max()
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    (year.unwrap_or(latest.year()), month.unwrap_or(latest.month()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filter_flags_work_before_and_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "tradelog",
            "--symbol",
            "aapl",
            "summary",
            "--from",
            "2024-01-01",
            "--user",
            "7",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Summary));
        let filter = cli.filter.to_filter();
        assert_eq!(filter.symbol.as_deref(), Some("aapl"));
        assert_eq!(filter.user_id, Some(7));
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.to, None);
    }

    #[test]
    fn groups_take_attribute_aliases() {
        let cli = Cli::try_parse_from(["tradelog", "groups", "--by", "market-condition"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Groups { by: GroupAttribute::MarketCondition }
        ));
        assert!(Cli::try_parse_from(["tradelog", "groups", "--by", "horoscope"]).is_err());
    }

    #[test]
    fn correlate_rejects_non_score_attributes() {
        let cli = Cli::try_parse_from(["tradelog", "correlate", "--score", "sleep_quality"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Correlate { score: ScoreAttribute::SleepQuality }
        ));
        assert!(Cli::try_parse_from(["tradelog", "correlate", "--score", "mood"]).is_err());
    }

    #[test]
    fn calendar_month_is_range_checked() {
        assert!(Cli::try_parse_from(["tradelog", "calendar", "--month", "13"]).is_err());
        let cli = Cli::try_parse_from(["tradelog", "calendar", "--year", "2024", "--month", "2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Calendar { year: Some(2024), month: Some(2) }
        ));
    }

    #[test]
    fn format_overrides_parse_as_value_enum() {
        let cli = Cli::try_parse_from(["tradelog", "--format", "json", "monthly"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn risk_calculators_parse_decimal_arguments() {
        let cli = Cli::try_parse_from([
            "tradelog", "risk", "position-size", "--balance", "10000", "--risk-pct", "1",
            "--entry", "50", "--stop", "48",
        ])
        .unwrap();
        let Commands::Risk { calculator: RiskCommand::PositionSize { balance, risk_pct, .. } } =
            cli.command
        else {
            panic!("expected the position size calculator, got {:?}", cli.command);
        };
        assert_eq!(balance, Decimal::from(10_000));
        assert_eq!(risk_pct, Decimal::ONE);

        assert!(Cli::try_parse_from(["tradelog", "risk", "ruin", "--risk-pct", "two", "--win-rate", "0.5"]).is_err());
    }

    #[test]
    fn targets_split_r_multiples_on_commas() {
        let cli = Cli::try_parse_from([
            "tradelog", "risk", "targets", "--entry", "100", "--risk", "2", "--r", "1.5,4",
        ])
        .unwrap();
        let Commands::Risk { calculator: RiskCommand::Targets { r_multiples, .. } } = cli.command
        else {
            panic!("expected the targets calculator, got {:?}", cli.command);
        };
        assert_eq!(r_multiples, vec![Decimal::new(15, 1), Decimal::from(4)]);

        let cli = Cli::try_parse_from(["tradelog", "risk", "targets", "--entry", "100", "--risk", "2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Risk { calculator: RiskCommand::Targets { ref r_multiples, .. } } if r_multiples.is_empty()
        ));
    }

    #[test]
    fn alerts_take_an_optional_as_of_date() {
        let cli = Cli::try_parse_from(["tradelog", "alerts", "--as-of", "2024-03-05"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Alerts { as_of: Some(date) } if date == NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        ));
        assert!(matches!(
            Cli::try_parse_from(["tradelog", "alerts"]).unwrap().command,
            Commands::Alerts { as_of: None }
        ));
    }

    #[test]
    fn alert_account_size_follows_the_filter() {
        let journal = Journal::from_json_str(
            r#"{
                "accounts": [
                    { "id": "00000000-0000-0000-0000-000000000001",
                      "user_id": 1, "name": "Main", "size": "5000" },
                    { "id": "00000000-0000-0000-0000-000000000002",
                      "user_id": 1, "name": "Swing", "size": "2500" },
                    { "id": "00000000-0000-0000-0000-000000000003",
                      "user_id": 2, "name": "Other", "size": "1000" }
                ],
                "trades": []
            }"#,
        )
        .unwrap();

        let swing = Uuid::from_u128(2);
        assert_eq!(
            alert_account_size(&journal, &TradeFilter::new().account(swing)).unwrap(),
            Some(Decimal::from(2500))
        );
        assert_eq!(
            alert_account_size(&journal, &TradeFilter::new().user(1)).unwrap(),
            Some(Decimal::from(7500))
        );
        assert_eq!(
            alert_account_size(&journal, &TradeFilter::new()).unwrap(),
            Some(Decimal::from(8500))
        );
        assert_eq!(alert_account_size(&journal, &TradeFilter::new().user(9)).unwrap(), None);
    }

    #[test]
    fn calendar_defaults_to_the_latest_trade_month() {
        let journal = Journal::from_json_str(
            r#"{
                "accounts": [{
                    "id": "00000000-0000-0000-0000-000000000001",
                    "user_id": 1, "name": "Main", "size": "5000"
                }],
                "trades": [
                    { "account_id": "00000000-0000-0000-0000-000000000001", "user_id": 1,
                      "date": "2024-02-10", "symbol": "AAPL", "side": "Long",
                      "entry_price": "100", "exit_price": "110", "quantity": "1" },
                    { "account_id": "00000000-0000-0000-0000-000000000001", "user_id": 1,
                      "date": "2024-03-05", "symbol": "TSLA", "side": "Long",
                      "entry_price": "100", "exit_price": "90", "quantity": "1" }
                ]
            }"#,
        )
        .unwrap();

        let all = TradeFilter::new();
        assert_eq!(calendar_month(&journal, &all, None, None), (2024, 3));
        assert_eq!(calendar_month(&journal, &all, None, Some(1)), (2024, 1));
        let aapl = TradeFilter::new().symbol("AAPL");
        assert_eq!(calendar_month(&journal, &aapl, None, None), (2024, 2));
    }
}
