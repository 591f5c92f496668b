use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{Trade, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Selects the trades an aggregation is allowed to see.
///
/// Every field is optional; an empty filter lets everything through. The date
/// range is inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilter {
    pub user_id: Option<UserId>,
    pub account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub symbol: Option<String>,
}

impl TradeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn from(mut self, date: NaiveDate) -> Self {
        self.from = Some(date);
        self
    }

    pub fn to(mut self, date: NaiveDate) -> Self {
        self.to = Some(date);
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AnalyticsError::InvalidFilter(format!(
                    "start date {from} is after end date {to}"
                )));
            }
        }
        Ok(())
    }

    /// True when the user and date constraints admit an entry. Account and
    /// symbol are ignored, which is what non-trade records need.
    pub fn admits(&self, user_id: UserId, date: NaiveDate) -> bool {
        self.user_id.is_none_or(|u| u == user_id)
            && self.from.is_none_or(|from| date >= from)
            && self.to.is_none_or(|to| date <= to)
    }

    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.symbol
            .as_deref()
            .is_none_or(|s| s.trim().eq_ignore_ascii_case(symbol.trim()))
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        self.admits(trade.user_id, trade.date)
            && self.account_id.is_none_or(|a| a == trade.account_id)
            && self.matches_symbol(&trade.symbol)
    }

    /// Selects the matching trades in input order and checks each one.
    ///
    /// Excluded trades are never inspected. A selected trade whose derived
    /// fields disagree with its inputs fails the whole call.
    pub fn apply<'a>(&self, trades: &'a [Trade]) -> Result<Vec<&'a Trade>, AnalyticsError> {
        self.validate()?;
        trades
            .iter()
            .filter(|t| self.matches(t))
            .map(|t| {
                t.verify().map_err(|e| {
                    tracing::warn!(trade_id = %t.id, error = %e, "Rejecting malformed trade.");
                    AnalyticsError::MalformedRecord {
                        trade_id: t.id,
                        reason: e.to_string(),
                    }
                })?;
                Ok(t)
            })
            .collect()
    }
}
