//! Pretrained NLP pipelines for lexis, built on candle.
//!
//! Every pipeline runs on the CPU device and implements one of the
//! [`lexis_core`] pipeline traits. Use the [`loader`] functions at startup;
//! they never fail, returning a disabled [`lexis_core::Capability`] instead.

mod error;
pub mod generation;
pub mod hub;
pub mod loader;
pub mod qa;
pub mod summarize;
pub mod translate;

pub use error::ModelError;
pub use loader::{load_question_answerer, load_summarizer, load_translator};
pub use qa::DistilBertQa;
pub use summarize::T5Summarizer;
pub use translate::MarianTranslator;
