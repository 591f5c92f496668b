//! # Tradelog Journal Crate
//!
//! The store behind the trading journal: accounts, trades, and the journal
//! entries that sit around them (mistakes, avoided trades, pre-trade plans,
//! mindset check-ins, quotes, and daily notes).
//!
//! ## Architectural Principles
//!
//! - **Validate on the way in:** Every record is checked once, when it is added,
//!   replaced, or read from a document. Readers never re-validate.
//! - **Derived fields are owned here:** Trade PnL and R-multiple are computed by
//!   `core-types` on every write and recomputed on import, never copied.
//! - **Referential integrity:** A trade can only reference an existing account.
//!   Deleting a referenced account is blocked unless the caller opts into a
//!   cascade.
//! - **Storage-agnostic:** The journal lives in memory. Its serde document
//!   shape is the only exchange format; where the bytes live is the caller's
//!   concern.
//!
//! ## Public API
//!
//! - `Journal`: The collections and every mutation on them.
//! - `JournalDocument`: The exported JSON shape, lenient toward older exports.
//! - `DeletePolicy`: Block or cascade when deleting a referenced account.
//! - `JournalError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod collection;
pub mod document;
pub mod error;
pub mod journal;

// Re-export the key components to create a clean, public-facing API.
pub use collection::Collection;
pub use document::{JournalDocument, TradeDocument};
pub use error::JournalError;
pub use journal::{AccountRemoval, DeletePolicy, Journal};
