//! The exported JSON shape of a journal.
//!
//! Reading is lenient: trades written by older versions of the journal may be
//! missing their psychology fields, an id, or the derived PnL. Missing fields
//! take the defaults a new entry form would show. Stored PnL and R-multiple
//! values are never trusted; they are recomputed from prices on import.

use core_types::{
    AccountInput, AvoidedTrade, CoreError, DailyNote, MindsetCheckin, Mistake, PretradeAnalysis,
    Quote, Record, Side, Trade, TradeInput, UserId,
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_SCORE: u8 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalDocument {
    pub accounts: Vec<Record<AccountInput>>,
    pub trades: Vec<TradeDocument>,
    pub mistakes: Vec<Record<Mistake>>,
    pub avoided_trades: Vec<Record<AvoidedTrade>>,
    pub pretrade_analyses: Vec<Record<PretradeAnalysis>>,
    pub checkins: Vec<Record<MindsetCheckin>>,
    pub quotes: Vec<Record<Quote>>,
    pub daily_notes: Vec<Record<DailyNote>>,
}

/// A trade as it appears in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDocument {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: UserId,
    pub account_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub symbol: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub setup: String,
    #[serde(default = "default_market_condition")]
    pub market_condition: String,
    #[serde(default = "default_trade_type")]
    pub trade_type: String,
    #[serde(default = "default_mood")]
    pub mood: String,
    #[serde(default = "default_score")]
    pub focus_level: u8,
    #[serde(default = "default_score")]
    pub stress_level: u8,
    #[serde(default = "default_score")]
    pub sleep_quality: u8,
    #[serde(default = "default_score")]
    pub confidence: u8,
    #[serde(default)]
    pub influence: String,
    #[serde(default)]
    pub notes: String,
    // Derived. Written out for readers of the export, ignored on import.
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub r_multiple: Option<Decimal>,
}

fn default_market_condition() -> String {
    "Trending".to_string()
}

fn default_trade_type() -> String {
    "Daytrade".to_string()
}

fn default_mood() -> String {
    "Calm".to_string()
}

fn default_score() -> u8 {
    DEFAULT_SCORE
}

impl TradeDocument {
    /// Validates the entry and rebuilds the trade with freshly derived fields.
    pub fn into_trade(self) -> Result<Trade, CoreError> {
        let stored_pnl = self.pnl;
        let trade = Trade::new(
            self.id,
            TradeInput {
                user_id: self.user_id,
                account_id: self.account_id,
                date: self.date,
                time: self.time,
                symbol: self.symbol,
                side: self.side,
                entry_price: self.entry_price,
                exit_price: self.exit_price,
                quantity: self.quantity,
                stop_loss: self.stop_loss,
                duration_minutes: self.duration_minutes,
                setup: self.setup,
                market_condition: self.market_condition,
                trade_type: self.trade_type,
                mood: self.mood,
                focus_level: self.focus_level,
                stress_level: self.stress_level,
                sleep_quality: self.sleep_quality,
                confidence: self.confidence,
                influence: self.influence,
                notes: self.notes,
            },
        )?;

        // Older exports stored PnL rounded to cents.
        if let Some(stored) = stored_pnl {
            if stored.round_dp(2) != trade.pnl.round_dp(2) {
                tracing::warn!(
                    trade_id = %trade.id,
                    %stored,
                    derived = %trade.pnl,
                    "Stored PnL disagrees with prices; using the derived value."
                );
            }
        }
        Ok(trade)
    }
}

impl From<&Trade> for TradeDocument {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id,
            user_id: trade.user_id,
            account_id: trade.account_id,
            date: trade.date,
            time: trade.time,
            symbol: trade.symbol.clone(),
            side: trade.side,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            quantity: trade.quantity,
            stop_loss: trade.stop_loss,
            duration_minutes: trade.duration_minutes,
            setup: trade.setup.clone(),
            market_condition: trade.market_condition.clone(),
            trade_type: trade.trade_type.clone(),
            mood: trade.mood.clone(),
            focus_level: trade.focus_level,
            stress_level: trade.stress_level,
            sleep_quality: trade.sleep_quality,
            confidence: trade.confidence,
            influence: trade.influence.clone(),
            notes: trade.notes.clone(),
            pnl: Some(trade.pnl),
            r_multiple: trade.r_multiple,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn legacy_trade_takes_form_defaults() {
        let json = r#"{
            "account_id": "00000000-0000-0000-0000-000000000000",
            "date": "2024-05-02",
            "symbol": "nvda",
            "side": "Short",
            "entry_price": "120",
            "exit_price": "110",
            "quantity": "3",
            "stop_loss": "125"
        }"#;
        let document: TradeDocument = serde_json::from_str(json).unwrap();
        let trade = document.into_trade().unwrap();

        assert_eq!(trade.symbol, "NVDA");
        assert_eq!(trade.mood, "Calm");
        assert_eq!(trade.market_condition, "Trending");
        assert_eq!(trade.trade_type, "Daytrade");
        assert_eq!(
            (trade.focus_level, trade.stress_level, trade.sleep_quality, trade.confidence),
            (3, 3, 3, 3)
        );
        assert_eq!(trade.pnl, dec!(30));
        assert_eq!(trade.r_multiple, Some(dec!(2)));
        assert!(!trade.id.is_nil());
    }

    #[test]
    fn stored_pnl_is_replaced_by_the_derived_value() {
        let json = r#"{
            "account_id": "00000000-0000-0000-0000-000000000000",
            "date": "2024-05-02",
            "symbol": "AAPL",
            "side": "Long",
            "entry_price": "100",
            "exit_price": "101",
            "quantity": "10",
            "pnl": "999"
        }"#;
        let document: TradeDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.into_trade().unwrap().pnl, dec!(10));
    }

    #[test]
    fn invalid_scores_are_rejected() {
        let json = r#"{
            "account_id": "00000000-0000-0000-0000-000000000000",
            "date": "2024-05-02",
            "symbol": "AAPL",
            "side": "Long",
            "entry_price": "100",
            "exit_price": "101",
            "quantity": "10",
            "focus_level": 9
        }"#;
        let document: TradeDocument = serde_json::from_str(json).unwrap();
        assert!(matches!(
            document.into_trade(),
            Err(CoreError::InvalidInput(field, _)) if field == "focus_level"
        ));
    }
}
