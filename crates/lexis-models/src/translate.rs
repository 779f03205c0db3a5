//! Marian machine-translation pipeline.

use std::sync::Mutex;

use candle_core::{Device, Tensor};
use candle_transformers::models::marian::{self, MTModel};
use lexis_config::TranslatorConfig;
use lexis_core::text::chunk_sentences;
use lexis_core::{PipelineError, Translator};
use serde_json::Value;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::generation::{greedy_decode, last_logits, lock_decoder, DecodeBudget};
use crate::hub::ModelFiles;
use crate::ModelError;

/// Translator over a Marian (OPUS-MT) checkpoint.
///
/// Marian checkpoints ship SentencePiece models; the source and target
/// tokenizers are read from converted `tokenizer.json` files instead.
pub struct MarianTranslator {
    model: Mutex<MTModel>,
    source: Tokenizer,
    target: Tokenizer,
    config: marian::Config,
    chunk_chars: usize,
    max_decoding_steps: usize,
    device: Device,
}

impl MarianTranslator {
    pub fn load(settings: &TranslatorConfig, device: &Device) -> Result<Self, ModelError> {
        let files = ModelFiles::resolve(&settings.model_id, settings.revision.as_deref())?;
        let mut raw: Value = files.load_config()?;
        fill_config_defaults(&mut raw);
        let config: marian::Config = serde_json::from_value(raw)?;

        let tokenizer_files = ModelFiles::resolve(&settings.tokenizer_repo, None)?;
        let source = tokenizer_files.load_tokenizer(&settings.source_tokenizer)?;
        let target = tokenizer_files.load_tokenizer(&settings.target_tokenizer)?;

        let vb = files.load_weights(device)?;
        let model = MTModel::new(&config, vb)?;

        Ok(Self {
            model: Mutex::new(model),
            source,
            target,
            config,
            chunk_chars: settings.chunk_chars,
            max_decoding_steps: settings.max_decoding_steps,
            device: device.clone(),
        })
    }

    fn translate_chunk(&self, model: &mut MTModel, chunk: &str) -> Result<String, ModelError> {
        let eos = self.config.eos_token_id;
        let stop = [eos, self.config.forced_eos_token_id];

        let mut ids = self
            .source
            .encode(chunk, true)
            .map_err(ModelError::tokenizer)?
            .get_ids()
            .to_vec();
        ids.push(eos);

        model.reset_kv_cache();
        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_xs = model.encoder().forward(&input, 0)?;

        let budget = DecodeBudget::up_to(self.max_decoding_steps);
        let tokens = greedy_decode(
            self.config.decoder_start_token_id,
            &stop,
            &[self.config.pad_token_id],
            budget,
            |seen| {
                let start_pos = seen.len() - 1;
                let fed = Tensor::new(&seen[start_pos..], &self.device)?.unsqueeze(0)?;
                let logits = model.decode(&fed, &encoder_xs, start_pos)?;
                last_logits(&logits)
            },
        )?;

        let text = self
            .target
            .decode(&tokens, true)
            .map_err(ModelError::tokenizer)?;
        Ok(text.trim().to_string())
    }

    fn run(&self, text: &str) -> Result<String, ModelError> {
        let chunks = chunk_sentences(text, self.chunk_chars);
        debug!("Translating {} chunk(s)", chunks.len());

        let mut model = lock_decoder(&self.model);
        let translated = chunks
            .iter()
            .map(|chunk| self.translate_chunk(&mut model, chunk))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(translated.join(" "))
    }
}

impl Translator for MarianTranslator {
    fn translate(&self, text: &str) -> Result<String, PipelineError> {
        Ok(self.run(text)?)
    }
}

/// Fills keys that older OPUS-MT `config.json` files omit.
fn fill_config_defaults(raw: &mut Value) {
    let Some(obj) = raw.as_object_mut() else {
        return;
    };

    if let Some(vocab) = obj.get("vocab_size").cloned() {
        obj.entry("decoder_vocab_size").or_insert(vocab);
    }
    if let Some(eos) = obj.get("eos_token_id").cloned() {
        obj.entry("forced_eos_token_id").or_insert(eos);
    }
    obj.entry("share_encoder_decoder_embeddings")
        .or_insert(Value::Bool(true));
    obj.entry("use_cache").or_insert(Value::Bool(true));
    obj.entry("is_encoder_decoder").or_insert(Value::Bool(true));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_config_defaults_adds_missing_keys() {
        let mut raw = json!({
            "vocab_size": 61950,
            "eos_token_id": 0,
            "pad_token_id": 61949,
        });
        fill_config_defaults(&mut raw);

        assert_eq!(raw["decoder_vocab_size"], 61950);
        assert_eq!(raw["forced_eos_token_id"], 0);
        assert_eq!(raw["share_encoder_decoder_embeddings"], true);
        assert_eq!(raw["use_cache"], true);
    }

    #[test]
    fn test_fill_config_defaults_keeps_existing() {
        let mut raw = json!({
            "vocab_size": 100,
            "decoder_vocab_size": 50,
            "eos_token_id": 0,
            "forced_eos_token_id": 2,
            "share_encoder_decoder_embeddings": false,
        });
        fill_config_defaults(&mut raw);

        assert_eq!(raw["decoder_vocab_size"], 50);
        assert_eq!(raw["forced_eos_token_id"], 2);
        assert_eq!(raw["share_encoder_decoder_embeddings"], false);
    }

    #[test]
    #[ignore = "downloads opus-mt-en-hi from the hub"]
    fn test_translate_to_hindi() {
        let translator = MarianTranslator::load(&TranslatorConfig::default(), &Device::Cpu).unwrap();
        let translation = translator.translate("How are you?").unwrap();
        assert!(!translation.is_empty());
        assert!(translation.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)));
    }
}
