//! # Tradelog Core Types
//!
//! Layer 0 of the workspace: the record types every other crate speaks in.
//! Trades derive their PnL and R-multiple here, at write time, so that nothing
//! downstream ever has to trust a stored value it cannot recompute.

pub mod enums;
pub mod error;
pub mod records;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Currency, Side};
pub use error::CoreError;
pub use records::{
    AvoidedTrade, DailyNote, MindsetCheckin, Mistake, PretradeAnalysis, Quote, Record,
};
pub use structs::{
    Account, AccountInput, Owned, SCORE_RANGE, Trade, TradeInput, UserId, Validate,
    calculate_pnl, calculate_r_multiple,
};
