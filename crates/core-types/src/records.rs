//! Free-standing journal entries that live next to trades.
//!
//! None of these carry cross-entity invariants. Optional trade references may
//! point at trades that have since been deleted.

use crate::enums::Side;
use crate::error::CoreError;
use crate::structs::{Owned, UserId, Validate, positive, score};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A collection entry: a record body plus the identifier it was stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: Uuid,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Owned> Owned for Record<T> {
    fn user_id(&self) -> UserId {
        self.body.user_id()
    }
}

/// A logged trading mistake, e.g. "FOMO" or "Revenge Trading".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mistake {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub mistake_type: String,
    pub description: String,
    pub trade_id: Option<Uuid>,
}

/// A trade the user chose not to take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidedTrade {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub symbol: String,
    pub reason: String,
    /// Loss the user believes they avoided; zero when unknown.
    #[serde(default)]
    pub potential_loss: Decimal,
    #[serde(default)]
    pub notes: String,
}

/// A plan written down before entering a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretradeAnalysis {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub symbol: String,
    pub direction: Side,
    pub entry_plan: String,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Free text such as "1:2".
    #[serde(default)]
    pub risk_reward: String,
    pub confidence: u8,
    #[serde(default)]
    pub checklist: Vec<String>,
    #[serde(default)]
    pub executed: bool,
    #[serde(default)]
    pub trade_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindsetCheckin {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub focus_level: u8,
    pub locked_in: bool,
    pub emotional_state: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default)]
    pub author: String,
    pub created_at: NaiveDateTime,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// One note per user and calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyNote {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub note: String,
    pub mood: String,
    pub energy_level: u8,
    pub created_at: NaiveDateTime,
}

fn default_true() -> bool {
    true
}

fn non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(field, "must not be empty"));
    }
    Ok(())
}

impl Validate for Mistake {
    fn validate(&self) -> Result<(), CoreError> {
        non_empty("mistake_type", &self.mistake_type)
    }
}

impl Validate for AvoidedTrade {
    fn validate(&self) -> Result<(), CoreError> {
        non_empty("symbol", &self.symbol)?;
        if self.potential_loss < Decimal::ZERO {
            return Err(CoreError::invalid("potential_loss", "must not be negative"));
        }
        Ok(())
    }
}

impl Validate for PretradeAnalysis {
    fn validate(&self) -> Result<(), CoreError> {
        non_empty("symbol", &self.symbol)?;
        if let Some(stop) = self.stop_loss {
            positive("stop_loss", stop)?;
        }
        if let Some(target) = self.take_profit {
            positive("take_profit", target)?;
        }
        score("confidence", self.confidence)
    }
}

impl Validate for MindsetCheckin {
    fn validate(&self) -> Result<(), CoreError> {
        score("focus_level", self.focus_level)
    }
}

impl Validate for Quote {
    fn validate(&self) -> Result<(), CoreError> {
        non_empty("text", &self.text)
    }
}

impl Validate for DailyNote {
    fn validate(&self) -> Result<(), CoreError> {
        score("energy_level", self.energy_level)
    }
}

impl Owned for Mistake {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for AvoidedTrade {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for PretradeAnalysis {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for MindsetCheckin {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

impl Owned for DailyNote {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_flattens_body_next_to_id() {
        let record = Record {
            id: Uuid::nil(),
            body: Mistake {
                user_id: 2,
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                time: None,
                mistake_type: "FOMO".into(),
                description: "chased the open".into(),
                trade_id: None,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["mistake_type"], "FOMO");
        assert_eq!(json["id"], Uuid::nil().to_string());

        let back: Record<Mistake> = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn avoided_trade_rejects_negative_loss() {
        let avoided = AvoidedTrade {
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time: None,
            symbol: "TSLA".into(),
            reason: "no setup".into(),
            potential_loss: dec!(-5),
            notes: String::new(),
        };
        assert!(avoided.validate().is_err());
    }
}
