use thiserror::Error;

#[derive(Debug, Error)]
pub enum BondAnalyticsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Undefined discount factor: 1 + {rate}/{frequency} is not positive")]
    UndefinedDiscountFactor { rate: f64, frequency: u32 },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BondAnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        BondAnalyticsError::SerializationError(e.to_string())
    }
}
