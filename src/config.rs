use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    semantic::{chunker::DEFAULT_CHUNK_SIZE, embeddings::parse_model_name},
    storage::{BackendLocal, StorageManager},
};

pub const CONFIG_FILE: &str = "config.yaml";

/// Default embedding model (384 dimensions)
const DEFAULT_SEMANTIC_MODEL: &str = "all-MiniLM-L6-v2";
/// Default number of results returned by `find`
const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid utf8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the embedding model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_semantic_model")]
    pub model: String,

    /// Scale every embedding to unit length before storing it
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SEMANTIC_MODEL.to_string(),
            normalize: default_normalize(),
        }
    }
}

fn default_semantic_model() -> String {
    DEFAULT_SEMANTIC_MODEL.to_string()
}

fn default_normalize() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Maximum characters per ingested chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of notes returned by `find` when no count is given
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            semantic: SemanticConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: DEFAULT_TOP_K,
            base_path: PathBuf::new(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.top_k == 0 {
            return Err(ConfigError::Invalid(
                "top_k must be greater than 0".to_string(),
            ));
        }

        parse_model_name(&self.semantic.model)
            .map_err(|e| ConfigError::Invalid(format!("semantic.model: {e}")))?;

        Ok(())
    }

    pub fn load_with(base_path: &Path) -> Result<Self, ConfigError> {
        let store = BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            log::info!("Writing default config to {}", store.path(CONFIG_FILE).display());
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let store = BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
