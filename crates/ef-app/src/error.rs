//! Error types for the ef-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// and gives the CLI a single error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Record error: {0}")]
    Record(String),

    #[error("Filter error: {0}")]
    Filter(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Simulation not found: {0}")]
    NotFound(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ef-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Whether a retry of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Fetch(_))
    }
}

// Conversions from backend error types
impl From<ef_core::CoreError> for AppError {
    fn from(err: ef_core::CoreError) -> Self {
        AppError::Record(err.to_string())
    }
}

impl From<ef_core::ValidationError> for AppError {
    fn from(err: ef_core::ValidationError) -> Self {
        AppError::Record(err.to_string())
    }
}

impl From<ef_filter::FilterError> for AppError {
    fn from(err: ef_filter::FilterError) -> Self {
        AppError::Filter(err.to_string())
    }
}

impl From<ef_session::SessionError> for AppError {
    fn from(err: ef_session::SessionError) -> Self {
        AppError::Session(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(err.to_string())
    }
}
