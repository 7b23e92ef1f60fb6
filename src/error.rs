//! Errors raised while turning broker rows into transactions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid {field} '{value}' for fund {fund}")]
    InvalidNumber {
        field: &'static str,
        fund: String,
        value: String,
    },

    #[error("invalid transaction type '{value}' for fund {fund}")]
    InvalidDirection { fund: String, value: String },

    #[error("invalid order timestamp '{value}' for fund {fund}")]
    InvalidTimestamp { fund: String, value: String },

    #[error("profit step must be a positive number, got {0}")]
    InvalidProfitStep(f64),
}
