use thiserror::Error;

/// Main error type for training and serving
#[derive(Error, Debug)]
pub enum OrchidError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Dataset errors
    #[error("Dataset error: {0}")]
    Dataset(String),

    // Model artifact errors
    #[error("Model artifact error: {0}")]
    Model(String),

    // Training errors
    #[error("Training failed: {0}")]
    Training(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Request-boundary errors
    #[error(transparent)]
    Predict(#[from] PredictError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for OrchidError
pub type Result<T> = std::result::Result<T, OrchidError>;

/// Failures surfaced to the user of the prediction form.
///
/// Both variants render as a single `❌ Error:` line; the split only keeps the
/// message precise about whether the input or the model was at fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictError {
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("inference failed: {0}")]
    InferenceFailure(String),
}

impl PredictError {
    pub fn missing(field: &str) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: "field is missing".to_string(),
        }
    }

    pub fn not_a_number(field: &str, raw: &str) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: format!("{raw:?} is not a number"),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
