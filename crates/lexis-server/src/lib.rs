//! HTTP services exposing lexis NLP pipelines.
//!
//! Two routers share one state type:
//!
//! - [`app::nlp_router`] — summarization, translation and question answering
//! - [`app::summarizer_router`] — summarization with length metadata and a
//!   health probe

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod services;
pub mod telemetry;

use lexis_core::{Capability, QuestionAnswerer, SummaryParams, Summarizer, Translator};

const NOT_LOADED: &str = "not loaded by this service";

/// Pipelines decided at startup; read-only afterwards.
pub struct ServerState {
    pub summarizer: Capability<dyn Summarizer>,
    pub translator: Capability<dyn Translator>,
    pub qa: Capability<dyn QuestionAnswerer>,
    pub summary_params: SummaryParams,
}

impl ServerState {
    pub fn new(
        summarizer: Capability<dyn Summarizer>,
        translator: Capability<dyn Translator>,
        qa: Capability<dyn QuestionAnswerer>,
    ) -> Self {
        Self {
            summarizer,
            translator,
            qa,
            summary_params: SummaryParams::default(),
        }
    }

    /// State for a service that only offers summarization.
    pub fn summarizer_only(summarizer: Capability<dyn Summarizer>) -> Self {
        Self::new(
            summarizer,
            Capability::unavailable(NOT_LOADED),
            Capability::unavailable(NOT_LOADED),
        )
    }
}
