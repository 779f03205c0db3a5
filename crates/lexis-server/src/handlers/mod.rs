//! HTTP route handlers for the lexis services.

pub mod nlp;
pub mod summarizer;

use lexis_core::text::is_blank;

use crate::error::AppError;

pub(crate) const STATUS_HEALTHY: &str = "healthy";

/// Returns the field when present and not blank, otherwise a 400.
pub(crate) fn require(field: Option<String>, message: &str) -> Result<String, AppError> {
    match field {
        Some(value) if !is_blank(&value) => Ok(value),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}
