use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenoDealError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Insufficient financing: {available} available against {required} required for acquisition (shortfall {shortfall})"
    )]
    InsufficientFinancing {
        available: Decimal,
        required: Decimal,
        shortfall: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for RenoDealError {
    fn from(e: serde_json::Error) -> Self {
        RenoDealError::SerializationError(e.to_string())
    }
}
