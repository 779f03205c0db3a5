use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment keys
// ─────────────────────────────────────────────────────────────────────────────

pub const ENV_CONFIG: &str = "LEXIS_CONFIG";
pub const ENV_HOST: &str = "LEXIS_HOST";
pub const ENV_PORT: &str = "LEXIS_PORT";
pub const ENV_CORS: &str = "LEXIS_CORS";
pub const ENV_SUMMARIZER_MODEL: &str = "LEXIS_SUMMARIZER_MODEL";
pub const ENV_TRANSLATOR_MODEL: &str = "LEXIS_TRANSLATOR_MODEL";
pub const ENV_QA_MODEL: &str = "LEXIS_QA_MODEL";

// ─────────────────────────────────────────────────────────────────────────────
// Model Configs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Hub repo id, or a local directory holding the model files.
    pub model_id: String,
    pub revision: Option<String>,
    /// Task prefix prepended to every input.
    pub prefix: String,
    pub max_input_tokens: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model_id: "t5-small".into(),
            revision: None,
            prefix: "summarize: ".into(),
            max_input_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub model_id: String,
    pub revision: Option<String>,
    /// Repo (or local directory) holding the converted tokenizer files.
    pub tokenizer_repo: String,
    pub source_tokenizer: String,
    pub target_tokenizer: String,
    /// Input is split into sentence chunks of at most this many characters.
    pub chunk_chars: usize,
    pub max_decoding_steps: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model_id: "Helsinki-NLP/opus-mt-en-hi".into(),
            revision: None,
            tokenizer_repo: "lmz/candle-marian".into(),
            source_tokenizer: "tokenizer-marian-base-en-hi-en.json".into(),
            target_tokenizer: "tokenizer-marian-base-en-hi-hi.json".into(),
            chunk_chars: 400,
            max_decoding_steps: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub model_id: String,
    pub revision: Option<String>,
    /// Token window per forward pass, special tokens included.
    pub max_seq_len: usize,
    /// Question tokens kept; longer questions are cut.
    pub max_question_len: usize,
    /// Context tokens shared by consecutive windows over a long context.
    pub doc_stride: usize,
    /// Longest answer span considered, in tokens.
    pub max_answer_len: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            model_id: "distilbert-base-cased-distilled-squad".into(),
            revision: None,
            max_seq_len: 384,
            max_question_len: 64,
            doc_stride: 128,
            max_answer_len: 15,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub summarizer: SummarizerConfig,
    pub translator: TranslatorConfig,
    pub qa: QaConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub cors: bool,
    pub models: ModelsConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5001,
            cors: false,
            models: ModelsConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads the file named by `LEXIS_CONFIG` (or defaults), then applies
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(ENV_CONFIG) {
            Ok(path) => Self::load_from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = parse_value(ENV_PORT, &port)?;
        }
        if let Some(cors) = lookup(ENV_CORS) {
            self.cors = parse_flag(ENV_CORS, &cors)?;
        }
        if let Some(model) = lookup(ENV_SUMMARIZER_MODEL) {
            self.models.summarizer.model_id = model;
        }
        if let Some(model) = lookup(ENV_TRANSLATOR_MODEL) {
            self.models.translator.model_id = model;
        }
        if let Some(model) = lookup(ENV_QA_MODEL) {
            self.models.qa.model_id = model;
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:5001");
        assert!(!config.cors);
        assert_eq!(config.models.summarizer.model_id, "t5-small");
        assert_eq!(config.models.translator.model_id, "Helsinki-NLP/opus-mt-en-hi");
        assert_eq!(config.models.translator.chunk_chars, 400);
        assert_eq!(config.models.qa.max_answer_len, 15);
        assert_eq!(config.models.qa.doc_stride, 128);
        assert_eq!(config.models.qa.max_question_len, 64);
    }

    #[test]
    fn test_overrides() {
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(lookup_from(&[
                (ENV_HOST, "0.0.0.0"),
                (ENV_PORT, "8080"),
                (ENV_CORS, "true"),
                (ENV_QA_MODEL, "/models/qa"),
            ]))
            .unwrap();

        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.cors);
        assert_eq!(config.models.qa.model_id, "/models/qa");
        assert_eq!(config.models.summarizer.model_id, "t5-small");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[(ENV_PORT, "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_PORT));
    }

    #[test]
    fn test_invalid_flag() {
        let mut config = ServiceConfig::default();
        assert!(config
            .apply_overrides(lookup_from(&[(ENV_CORS, "maybe")]))
            .is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"port": 6000, "models": {{"summarizer": {{"model_id": "t5-base"}}}}}}"#
        )
        .unwrap();

        let config = ServiceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.models.summarizer.model_id, "t5-base");
        assert_eq!(config.models.summarizer.prefix, "summarize: ");
        assert_eq!(config.models.qa, QaConfig::default());
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ServiceConfig::load_from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
