use thiserror::Error;

use crate::validate::ValidationError;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown {what}: {value}")]
    UnknownVariant { what: &'static str, value: String },
}
