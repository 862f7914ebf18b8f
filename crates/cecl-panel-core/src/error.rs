use thiserror::Error;

#[derive(Debug, Error)]
pub enum CeclError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Schema error in {context}: missing required columns {missing:?}")]
    Schema {
        context: String,
        missing: Vec<String>,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CeclError {
    /// Build a schema error with a sorted, de-duplicated missing set.
    pub fn schema(context: impl Into<String>, missing: impl IntoIterator<Item = String>) -> Self {
        let mut missing: Vec<String> = missing.into_iter().collect();
        missing.sort();
        missing.dedup();
        CeclError::Schema {
            context: context.into(),
            missing,
        }
    }
}

impl From<serde_json::Error> for CeclError {
    fn from(e: serde_json::Error) -> Self {
        CeclError::SerializationError(e.to_string())
    }
}
