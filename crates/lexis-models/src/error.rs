use std::fmt;

use lexis_core::PipelineError;
use thiserror::Error;

/// Errors from loading or running a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    #[error("Hub error: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Missing model file: {0}")]
    MissingFile(String),
    #[error("No answer span found in context")]
    NoAnswer,
}

impl ModelError {
    pub(crate) fn tokenizer(e: impl fmt::Display) -> Self {
        ModelError::Tokenizer(e.to_string())
    }
}

impl From<ModelError> for PipelineError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Tokenizer(msg) => PipelineError::Tokenization(msg),
            ModelError::NoAnswer => PipelineError::InvalidInput(ModelError::NoAnswer.to_string()),
            other => PipelineError::Inference(other.to_string()),
        }
    }
}
