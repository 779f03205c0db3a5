//! Core domain types and pipeline traits for lexis.
//!
//! This crate provides the pieces shared by the model backends and the HTTP
//! services:
//!
//! - [`Summarizer`], [`Translator`], [`QuestionAnswerer`] — pipeline traits
//! - [`Capability`] — a pipeline that either loaded or was disabled at startup
//! - [`PipelineError`] — error type for inference calls
//! - [`SummaryParams`] — fixed generation bounds for summarization
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lexis_core::{Capability, PipelineError, SummaryParams, Summarizer};
//!
//! struct Echo;
//!
//! impl Summarizer for Echo {
//!     fn summarize(&self, text: &str, _params: &SummaryParams) -> Result<String, PipelineError> {
//!         Ok(text.to_string())
//!     }
//! }
//!
//! let summarizer: Capability<dyn Summarizer> = Capability::ready(Arc::new(Echo));
//! assert!(summarizer.is_available());
//! ```

pub mod text;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The model forward pass or decoding loop failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Input could not be tokenized, or output could not be detokenized.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Input was rejected before reaching the model.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Generation bounds for summarization, counted in decoder tokens.
///
/// Decoding is always greedy, so the same input yields the same summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParams {
    /// Upper bound on the generated sequence, decoder start token included.
    pub max_length: usize,
    /// End-of-sequence is suppressed until this many tokens exist.
    pub min_length: usize,
}

impl SummaryParams {
    pub const MAX_LENGTH: usize = 130;
    pub const MIN_LENGTH: usize = 30;
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            max_length: Self::MAX_LENGTH,
            min_length: Self::MIN_LENGTH,
        }
    }
}

/// An extracted answer span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text, sliced verbatim from the context.
    pub text: String,
    /// Product of start and end probabilities.
    pub score: f32,
    /// Byte offset of the span start in the context.
    pub start: usize,
    /// Byte offset one past the span end in the context.
    pub end: usize,
}

/// Produces a shorter text preserving the salient content.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, PipelineError>;
}

/// Maps text from the source language to the target language.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> Result<String, PipelineError>;
}

/// Selects an answer span from a context given a question.
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<Answer, PipelineError>;
}

/// A pipeline handle, or the reason it could not be loaded.
///
/// Decided once at startup and never changed afterwards.
pub enum Capability<T: ?Sized> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T: ?Sized> Capability<T> {
    pub fn ready(pipeline: Arc<T>) -> Self {
        Capability::Ready(pipeline)
    }

    pub fn unavailable(reason: impl fmt::Display) -> Self {
        Capability::Unavailable(reason.to_string())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Ready(_))
    }

    /// Returns a shared handle to the pipeline if it loaded.
    pub fn get(&self) -> Option<Arc<T>> {
        match self {
            Capability::Ready(pipeline) => Some(Arc::clone(pipeline)),
            Capability::Unavailable(_) => None,
        }
    }

    /// Why the pipeline is unavailable, if it is.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Capability::Ready(_) => None,
            Capability::Unavailable(reason) => Some(reason),
        }
    }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Ready(pipeline) => Capability::Ready(Arc::clone(pipeline)),
            Capability::Unavailable(reason) => Capability::Unavailable(reason.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Ready(_) => f.write_str("Ready"),
            Capability::Unavailable(reason) => write!(f, "Unavailable({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Translator for Upper {
        fn translate(&self, text: &str) -> Result<String, PipelineError> {
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn test_summary_params_defaults() {
        let params = SummaryParams::default();
        assert_eq!(params.max_length, 130);
        assert_eq!(params.min_length, 30);
    }

    #[test]
    fn test_ready_capability() {
        let cap: Capability<dyn Translator> = Capability::ready(Arc::new(Upper));
        assert!(cap.is_available());
        assert!(cap.reason().is_none());

        let translator = cap.get().unwrap();
        assert_eq!(translator.translate("hi").unwrap(), "HI");
    }

    #[test]
    fn test_unavailable_capability() {
        let cap: Capability<dyn Translator> = Capability::unavailable("weights missing");
        assert!(!cap.is_available());
        assert!(cap.get().is_none());
        assert_eq!(cap.reason(), Some("weights missing"));
        assert_eq!(format!("{:?}", cap.clone()), "Unavailable(weights missing)");
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::Inference("shape mismatch".into());
        assert_eq!(err.to_string(), "inference failed: shape mismatch");
    }

    #[test]
    fn test_answer_serializes_offsets() {
        let answer = Answer {
            text: "Paris".into(),
            score: 0.5,
            start: 10,
            end: 15,
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["text"], "Paris");
        assert_eq!(json["start"], 10);
        assert_eq!(json["end"], 15);
    }
}
