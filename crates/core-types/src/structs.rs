use crate::enums::{Currency, Side};
use crate::error::CoreError;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

/// Identifies the owner of a journal record.
pub type UserId = u32;

/// Self-assessed psychology scores run from 1 (very low) to 5 (very high).
pub const SCORE_RANGE: RangeInclusive<u8> = 1..=5;

/// Records that must be checked once before they enter a collection.
pub trait Validate {
    fn validate(&self) -> Result<(), CoreError>;
}

/// Records that belong to a single user.
pub trait Owned {
    fn user_id(&self) -> UserId;
}

/// Signed result of a closed position.
///
/// Fails when the result does not fit in a `Decimal`.
pub fn calculate_pnl(
    side: Side,
    entry: Decimal,
    exit: Decimal,
    quantity: Decimal,
) -> Result<Decimal, CoreError> {
    let move_per_unit = match side {
        Side::Long => exit.checked_sub(entry),
        Side::Short => entry.checked_sub(exit),
    };
    move_per_unit
        .and_then(|m| m.checked_mul(quantity))
        .ok_or_else(|| CoreError::invalid("quantity", "pnl overflows"))
}

/// PnL as a multiple of the amount put at risk between entry and stop loss.
///
/// Returns `None` when there is no stop loss, the stop sits on the entry price,
/// or the risk amount is too large to represent.
pub fn calculate_r_multiple(
    pnl: Decimal,
    entry: Decimal,
    stop_loss: Option<Decimal>,
    quantity: Decimal,
) -> Option<Decimal> {
    let risk = entry.checked_sub(stop_loss?)?.abs().checked_mul(quantity)?;
    if risk.is_zero() {
        return None;
    }
    pnl.checked_div(risk)
}

/// Everything a user enters for a trade. PnL and R-multiple are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInput {
    pub user_id: UserId,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub symbol: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub duration_minutes: u32,
    pub setup: String,
    pub market_condition: String,
    pub trade_type: String,
    pub mood: String,
    pub focus_level: u8,
    pub stress_level: u8,
    pub sleep_quality: u8,
    pub confidence: u8,
    pub influence: String,
    pub notes: String,
}

impl Validate for TradeInput {
    fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.trim().is_empty() {
            return Err(CoreError::invalid("symbol", "must not be empty"));
        }
        positive("entry_price", self.entry_price)?;
        positive("exit_price", self.exit_price)?;
        positive("quantity", self.quantity)?;
        if let Some(stop) = self.stop_loss {
            positive("stop_loss", stop)?;
        }
        score("focus_level", self.focus_level)?;
        score("stress_level", self.stress_level)?;
        score("sleep_quality", self.sleep_quality)?;
        score("confidence", self.confidence)?;
        Ok(())
    }
}

/// A single executed position in the journal.
///
/// `pnl` and `r_multiple` are derived from the price, quantity and side fields
/// whenever the trade is created or replaced. They are never set on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub user_id: UserId,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub symbol: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub stop_loss: Option<Decimal>,
    pub duration_minutes: u32,
    pub setup: String,
    pub market_condition: String,
    pub trade_type: String,
    pub mood: String,
    pub focus_level: u8,
    pub stress_level: u8,
    pub sleep_quality: u8,
    pub confidence: u8,
    pub influence: String,
    pub notes: String,
    pub pnl: Decimal,
    pub r_multiple: Option<Decimal>,
}

impl Trade {
    /// Validates the input and builds a trade with its derived fields filled in.
    pub fn new(id: Uuid, input: TradeInput) -> Result<Self, CoreError> {
        input.validate()?;
        let pnl = calculate_pnl(input.side, input.entry_price, input.exit_price, input.quantity)?;
        let r_multiple =
            calculate_r_multiple(pnl, input.entry_price, input.stop_loss, input.quantity);

        Ok(Self {
            id,
            user_id: input.user_id,
            account_id: input.account_id,
            date: input.date,
            time: input.time,
            symbol: input.symbol.trim().to_uppercase(),
            side: input.side,
            entry_price: input.entry_price,
            exit_price: input.exit_price,
            quantity: input.quantity,
            stop_loss: input.stop_loss,
            duration_minutes: input.duration_minutes,
            setup: input.setup,
            market_condition: input.market_condition,
            trade_type: input.trade_type,
            mood: input.mood,
            focus_level: input.focus_level,
            stress_level: input.stress_level,
            sleep_quality: input.sleep_quality,
            confidence: input.confidence,
            influence: input.influence,
            notes: input.notes,
            pnl,
            r_multiple,
        })
    }

    /// Full-record replacement. The id is kept, every other field comes from `input`.
    pub fn replace(&mut self, input: TradeInput) -> Result<(), CoreError> {
        *self = Trade::new(self.id, input)?;
        Ok(())
    }

    /// The editable part of the trade, e.g. to pre-fill an edit form.
    pub fn to_input(&self) -> TradeInput {
        TradeInput {
            user_id: self.user_id,
            account_id: self.account_id,
            date: self.date,
            time: self.time,
            symbol: self.symbol.clone(),
            side: self.side,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            quantity: self.quantity,
            stop_loss: self.stop_loss,
            duration_minutes: self.duration_minutes,
            setup: self.setup.clone(),
            market_condition: self.market_condition.clone(),
            trade_type: self.trade_type.clone(),
            mood: self.mood.clone(),
            focus_level: self.focus_level,
            stress_level: self.stress_level,
            sleep_quality: self.sleep_quality,
            confidence: self.confidence,
            influence: self.influence.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Checks that the stored derived fields still equal the function of their inputs.
    pub fn verify(&self) -> Result<(), CoreError> {
        positive("entry_price", self.entry_price)?;
        positive("exit_price", self.exit_price)?;
        positive("quantity", self.quantity)?;

        let expected_pnl =
            calculate_pnl(self.side, self.entry_price, self.exit_price, self.quantity)?;
        if expected_pnl != self.pnl {
            return Err(CoreError::DerivedMismatch {
                field: "pnl",
                stored: self.pnl.to_string(),
                expected: expected_pnl.to_string(),
            });
        }

        let expected_r =
            calculate_r_multiple(expected_pnl, self.entry_price, self.stop_loss, self.quantity);
        if expected_r != self.r_multiple {
            return Err(CoreError::DerivedMismatch {
                field: "r_multiple",
                stored: format!("{:?}", self.r_multiple),
                expected: format!("{:?}", expected_r),
            });
        }
        Ok(())
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }

    pub fn is_breakeven(&self) -> bool {
        self.pnl.is_zero()
    }
}

impl Owned for Trade {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInput {
    pub user_id: UserId,
    pub name: String,
    /// Starting balance of the account.
    pub size: Decimal,
    #[serde(default)]
    pub currency: Currency,
}

impl Validate for AccountInput {
    fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid("name", "must not be empty"));
        }
        positive("size", self.size)
    }
}

/// A named trading account. Every trade references exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub size: Decimal,
    pub currency: Currency,
}

impl Account {
    pub fn new(id: Uuid, input: AccountInput) -> Result<Self, CoreError> {
        input.validate()?;
        Ok(Self {
            id,
            user_id: input.user_id,
            name: input.name.trim().to_string(),
            size: input.size,
            currency: input.currency,
        })
    }
}

impl Owned for Account {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

pub(crate) fn positive(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value <= Decimal::ZERO {
        return Err(CoreError::invalid(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

pub(crate) fn score(field: &str, value: u8) -> Result<(), CoreError> {
    if !SCORE_RANGE.contains(&value) {
        return Err(CoreError::invalid(
            field,
            format!(
                "must be between {} and {}, got {value}",
                SCORE_RANGE.start(),
                SCORE_RANGE.end()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn input(side: Side, entry: Decimal, exit: Decimal, qty: Decimal) -> TradeInput {
        TradeInput {
            user_id: 1,
            account_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            time: NaiveTime::from_hms_opt(15, 30, 0),
            symbol: " aapl ".to_string(),
            side,
            entry_price: entry,
            exit_price: exit,
            quantity: qty,
            stop_loss: None,
            duration_minutes: 12,
            setup: "Breakout".to_string(),
            market_condition: "Trending".to_string(),
            trade_type: "Daytrade".to_string(),
            mood: "Calm".to_string(),
            focus_level: 3,
            stress_level: 3,
            sleep_quality: 3,
            confidence: 3,
            influence: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn long_and_short_pnl() {
        assert_eq!(calculate_pnl(Side::Long, dec!(100), dec!(110), dec!(2)), Ok(dec!(20)));
        assert_eq!(calculate_pnl(Side::Short, dec!(100), dec!(110), dec!(2)), Ok(dec!(-20)));
    }

    #[test]
    fn unrepresentable_pnl_is_rejected_at_creation() {
        let huge = input(Side::Long, dec!(1), dec!(100000000000000000), dec!(100000000000000));
        assert!(matches!(
            Trade::new(Uuid::nil(), huge),
            Err(CoreError::InvalidInput(field, reason)) if field == "quantity" && reason == "pnl overflows"
        ));
    }

    #[test]
    fn r_multiple_is_none_when_risk_overflows() {
        let r = calculate_r_multiple(dec!(10), dec!(1), Some(dec!(70000000000000000000000000000)), dec!(2));
        assert_eq!(r, None);
    }

    #[test]
    fn equal_entry_and_exit_is_exactly_zero() {
        let trade = Trade::new(Uuid::nil(), input(Side::Long, dec!(100), dec!(100), dec!(10))).unwrap();
        assert_eq!(trade.pnl, Decimal::ZERO);
        assert!(trade.is_breakeven());
        assert!(!trade.is_win() && !trade.is_loss());
    }

    #[test]
    fn new_trade_derives_fields_and_normalizes_symbol() {
        let mut i = input(Side::Long, dec!(50.25), dec!(51.75), dec!(100));
        i.stop_loss = Some(dec!(49.75));
        let trade = Trade::new(Uuid::nil(), i).unwrap();

        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.pnl, dec!(150));
        assert_eq!(trade.r_multiple, Some(dec!(3)));
        assert!(trade.verify().is_ok());
    }

    #[test]
    fn r_multiple_is_none_without_stop_or_risk() {
        assert_eq!(calculate_r_multiple(dec!(10), dec!(100), None, dec!(1)), None);
        assert_eq!(calculate_r_multiple(dec!(10), dec!(100), Some(dec!(100)), dec!(1)), None);
    }

    #[test]
    fn replace_recomputes_derived_fields() {
        let mut trade = Trade::new(Uuid::nil(), input(Side::Long, dec!(10), dec!(12), dec!(5))).unwrap();
        assert_eq!(trade.pnl, dec!(10));

        let mut edited = trade.to_input();
        edited.side = Side::Short;
        trade.replace(edited).unwrap();

        assert_eq!(trade.id, Uuid::nil());
        assert_eq!(trade.pnl, dec!(-10));
        assert!(trade.verify().is_ok());
    }

    #[test]
    fn rejects_non_positive_prices_and_bad_scores() {
        let bad_price = input(Side::Long, dec!(0), dec!(12), dec!(5));
        assert!(matches!(
            Trade::new(Uuid::nil(), bad_price),
            Err(CoreError::InvalidInput(field, _)) if field == "entry_price"
        ));

        let mut bad_score = input(Side::Long, dec!(10), dec!(12), dec!(5));
        bad_score.stress_level = 6;
        assert!(Trade::new(Uuid::nil(), bad_score).is_err());
    }

    #[test]
    fn verify_catches_tampered_pnl() {
        let mut trade = Trade::new(Uuid::nil(), input(Side::Long, dec!(10), dec!(12), dec!(5))).unwrap();
        trade.pnl = dec!(11);
        assert!(matches!(
            trade.verify(),
            Err(CoreError::DerivedMismatch { field: "pnl", .. })
        ));
    }

    #[test]
    fn account_requires_name_and_size() {
        let ok = Account::new(
            Uuid::nil(),
            AccountInput { user_id: 1, name: "Futures".into(), size: dec!(10000), currency: Currency::Euro },
        )
        .unwrap();
        assert_eq!(ok.currency, Currency::Euro);

        let err = Account::new(
            Uuid::nil(),
            AccountInput { user_id: 1, name: " ".into(), size: dec!(10000), currency: Currency::Dollar },
        );
        assert!(err.is_err());
    }
}
