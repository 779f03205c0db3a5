//! T5 summarization pipeline.

use std::sync::Mutex;

use candle_core::{Device, Tensor};
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use lexis_config::SummarizerConfig;
use lexis_core::{PipelineError, SummaryParams, Summarizer};
use tokenizers::Tokenizer;
use tracing::debug;

use crate::generation::{greedy_decode, last_logits, lock_decoder, DecodeBudget};
use crate::hub::{ModelFiles, TOKENIZER_FILE};
use crate::ModelError;

/// Abstractive summarizer over a T5 checkpoint.
///
/// The decoder keeps a KV cache, so generations on one instance run one at a
/// time.
pub struct T5Summarizer {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: t5::Config,
    prefix: String,
    max_input_tokens: usize,
    device: Device,
}

impl T5Summarizer {
    pub fn load(settings: &SummarizerConfig, device: &Device) -> Result<Self, ModelError> {
        let files = ModelFiles::resolve(&settings.model_id, settings.revision.as_deref())?;
        let config: t5::Config = files.load_config()?;
        let tokenizer = files.load_tokenizer(TOKENIZER_FILE)?;
        let vb = files.load_weights(device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            prefix: settings.prefix.clone(),
            max_input_tokens: settings.max_input_tokens,
            device: device.clone(),
        })
    }

    fn generate(&self, text: &str, params: &SummaryParams) -> Result<String, ModelError> {
        let eos = self.config.eos_token_id as u32;
        let start = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;

        let encoding = self
            .tokenizer
            .encode(format!("{}{}", self.prefix, text), true)
            .map_err(ModelError::tokenizer)?;
        let mut ids = encoding.get_ids().to_vec();
        if ids.len() > self.max_input_tokens {
            ids.truncate(self.max_input_tokens.saturating_sub(1));
            ids.push(eos);
        }
        debug!("Summarizing {} input tokens", ids.len());
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;

        let mut model = lock_decoder(&self.model);
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;

        let use_cache = self.config.use_cache;
        let tokens = greedy_decode(start, &[eos], &[], DecodeBudget::from(params), |seen| {
            let fed = if use_cache && seen.len() > 1 {
                &seen[seen.len() - 1..]
            } else {
                seen
            };
            let decoder_ids = Tensor::new(fed, &self.device)?.unsqueeze(0)?;
            let logits = model.decode(&decoder_ids, &encoder_output)?;
            last_logits(&logits)
        })?;
        drop(model);

        let summary = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(ModelError::tokenizer)?;
        Ok(summary.trim().to_string())
    }
}

impl Summarizer for T5Summarizer {
    fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, PipelineError> {
        Ok(self.generate(text, params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "downloads t5-small from the hub"]
    fn test_summarize_short_text() {
        let summarizer = T5Summarizer::load(&SummarizerConfig::default(), &Device::Cpu).unwrap();
        let params = SummaryParams::default();

        let summary = summarizer
            .summarize("The quick brown fox jumps over the lazy dog.", &params)
            .unwrap();

        assert!(!summary.is_empty());
        let tokens = summarizer.tokenizer.encode(summary.as_str(), false).unwrap();
        assert!(tokens.len() < params.max_length);
    }

    #[test]
    #[ignore = "downloads t5-small from the hub"]
    fn test_summarize_is_deterministic() {
        let summarizer = T5Summarizer::load(&SummarizerConfig::default(), &Device::Cpu).unwrap();
        let params = SummaryParams::default();
        let text = "Rust is a systems programming language focused on safety. \
                    It prevents data races at compile time. \
                    Many companies now use it in production services.";

        let first = summarizer.summarize(text, &params).unwrap();
        let second = summarizer.summarize(text, &params).unwrap();
        assert_eq!(first, second);
    }
}
