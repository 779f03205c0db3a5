//! Model file resolution: a local directory or a Hugging Face hub repo.

use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::{Api, ApiRepo};
use hf_hub::{Repo, RepoType};
use serde::de::DeserializeOwned;
use tokenizers::Tokenizer;
use tracing::debug;

use crate::ModelError;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const SAFETENSORS_FILE: &str = "model.safetensors";
pub const PTH_FILE: &str = "pytorch_model.bin";

/// Where a model's files come from.
pub enum ModelFiles {
    Local(PathBuf),
    Hub { id: String, repo: ApiRepo },
}

impl ModelFiles {
    /// An existing directory wins over a hub repo of the same name.
    pub fn resolve(model_id: &str, revision: Option<&str>) -> Result<Self, ModelError> {
        let path = Path::new(model_id);
        if path.is_dir() {
            return Ok(ModelFiles::Local(path.to_path_buf()));
        }

        let repo = match revision {
            Some(rev) => Repo::with_revision(model_id.to_string(), RepoType::Model, rev.to_string()),
            None => Repo::model(model_id.to_string()),
        };
        let api = Api::new()?;
        Ok(ModelFiles::Hub {
            id: model_id.to_string(),
            repo: api.repo(repo),
        })
    }

    pub fn id(&self) -> String {
        match self {
            ModelFiles::Local(dir) => dir.display().to_string(),
            ModelFiles::Hub { id, .. } => id.clone(),
        }
    }

    /// Local path of `name`, downloading it first if needed.
    pub fn get(&self, name: &str) -> Result<PathBuf, ModelError> {
        match self {
            ModelFiles::Local(dir) => {
                let path = dir.join(name);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(ModelError::MissingFile(path.display().to_string()))
                }
            }
            ModelFiles::Hub { repo, .. } => Ok(repo.get(name)?),
        }
    }

    pub fn load_config<T: DeserializeOwned>(&self) -> Result<T, ModelError> {
        let content = fs::read_to_string(self.get(CONFIG_FILE)?)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_tokenizer(&self, name: &str) -> Result<Tokenizer, ModelError> {
        Tokenizer::from_file(self.get(name)?).map_err(ModelError::tokenizer)
    }

    /// Prefers safetensors, falling back to a pickled PyTorch checkpoint.
    pub fn load_weights(&self, device: &Device) -> Result<VarBuilder<'static>, ModelError> {
        match self.get(SAFETENSORS_FILE) {
            Ok(path) => {
                // SAFETY: the weights file is not modified while mapped.
                let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? };
                Ok(vb)
            }
            Err(e) => {
                debug!("{} unavailable for {} ({}), trying {}", SAFETENSORS_FILE, self.id(), e, PTH_FILE);
                let path = self.get(PTH_FILE)?;
                Ok(VarBuilder::from_pth(path, DType::F32, device)?)
            }
        }
    }
}
