//! Startup loading of pipelines into [`Capability`] handles.
//!
//! Loading is blocking (hub downloads, weight mapping). A failure is logged
//! and leaves the capability disabled for the life of the process.

use std::sync::Arc;
use std::time::Instant;

use candle_core::Device;
use lexis_config::{QaConfig, SummarizerConfig, TranslatorConfig};
use lexis_core::{Capability, QuestionAnswerer, Summarizer, Translator};
use tracing::{error, info};

use crate::{DistilBertQa, MarianTranslator, ModelError, T5Summarizer};

pub fn load_summarizer(config: &SummarizerConfig) -> Capability<dyn Summarizer> {
    load("summarization", &config.model_id, || {
        let summarizer = T5Summarizer::load(config, &Device::Cpu)?;
        Ok(Arc::new(summarizer) as Arc<dyn Summarizer>)
    })
}

pub fn load_translator(config: &TranslatorConfig) -> Capability<dyn Translator> {
    load("translation", &config.model_id, || {
        let translator = MarianTranslator::load(config, &Device::Cpu)?;
        Ok(Arc::new(translator) as Arc<dyn Translator>)
    })
}

pub fn load_question_answerer(config: &QaConfig) -> Capability<dyn QuestionAnswerer> {
    load("question-answering", &config.model_id, || {
        let qa = DistilBertQa::load(config, &Device::Cpu)?;
        Ok(Arc::new(qa) as Arc<dyn QuestionAnswerer>)
    })
}

fn load<T: ?Sized>(
    task: &str,
    model_id: &str,
    build: impl FnOnce() -> Result<Arc<T>, ModelError>,
) -> Capability<T> {
    info!("Loading {} pipeline: {}", task, model_id);
    let started = Instant::now();

    match build() {
        Ok(pipeline) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "{} pipeline initialized successfully", task
            );
            Capability::ready(pipeline)
        }
        Err(e) => {
            error!("Failed to initialize {} pipeline ({}): {}", task, model_id, e);
            Capability::unavailable(e)
        }
    }
}
