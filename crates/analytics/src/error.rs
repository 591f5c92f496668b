use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Malformed trade record {trade_id}: {reason}")]
    MalformedRecord { trade_id: Uuid, reason: String },

    #[error("Unknown grouping attribute '{0}'")]
    UnknownAttribute(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}

impl AnalyticsError {
    pub(crate) fn overflow(quantity: &str) -> Self {
        AnalyticsError::Calculation(format!("{quantity} does not fit in a decimal"))
    }
}
