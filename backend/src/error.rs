use thiserror::Error;
use tournament_settlement::{ErrorCategory, SettlementError};

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejections from the settlement program
    #[error("Settlement rejected: {0}")]
    Settlement(#[from] SettlementError),

    /// Decryption gateway transport errors
    #[error("Gateway error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected gateway responses
    #[error("Gateway protocol error: {0}")]
    Gateway(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Audit chain does not verify
    #[error("Audit trail corrupted at line {line}: {reason}")]
    AuditCorrupted { line: usize, reason: String },

    /// Generic error with message
    #[error("{0}")]
    Message(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Whether repeating the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Settlement(e) => e.is_retryable(),
            AppError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Validation(_) => 400,
            AppError::Settlement(e) => match e.category() {
                ErrorCategory::Authorization => 403,
                ErrorCategory::Phase | ErrorCategory::ConfidentialReveal => 409,
                ErrorCategory::Validation | ErrorCategory::Threshold => 400,
                ErrorCategory::FundInvariant => 422,
                ErrorCategory::Integration => 500,
            },
            AppError::Http(_) | AppError::Gateway(_) => 502,
            _ => 500,
        }
    }
}

/// Convenience function to convert Option<T> to Result<T, AppError>
pub fn option_to_result<T>(opt: Option<T>, error_msg: &str) -> AppResult<T> {
    opt.ok_or_else(|| AppError::NotFound(error_msg.to_string()))
}
