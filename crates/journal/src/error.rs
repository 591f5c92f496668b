use core_types::CoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("The requested {kind} {id} was not found in the journal.")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Account {0} does not exist.")]
    UnknownAccount(Uuid),

    #[error("Account {account_id} is still referenced by {trades} trade(s).")]
    AccountInUse { account_id: Uuid, trades: usize },

    #[error("Duplicate {kind} id {id} in journal document.")]
    DuplicateId { kind: &'static str, id: Uuid },

    #[error("Invalid record: {0}")]
    Invalid(#[from] CoreError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),
}
