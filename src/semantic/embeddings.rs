//! Embedding model wrapper for fastembed.
//!
//! Provides a high-level interface for generating embeddings:
//! - `Embedder` trait so the ranking pipeline can run against any model
//! - `FastEmbedder`, the fastembed-backed implementation
//! - `SharedEmbedder`, a load-once provider that defers the expensive model
//!   initialization until the first embedding is requested

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{InitOptions, TextEmbedding};
use once_cell::sync::OnceCell;

use crate::config::SemanticConfig;

/// Anything that turns text into a fixed-length vector.
pub trait Embedder: Send + Sync {
    /// Model name, used for logging.
    fn name(&self) -> &str;

    /// Generate an embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Generate embeddings for multiple texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),
}

/// Options used to build the embedding model on first use.
#[derive(Debug, Clone)]
pub struct EmbedderOptions {
    pub model: String,
    pub normalize: bool,
    /// Directory the model files are downloaded into
    pub cache_dir: PathBuf,
}

impl EmbedderOptions {
    pub fn from_config(config: &SemanticConfig, cache_dir: PathBuf) -> Self {
        Self {
            model: config.model.clone(),
            normalize: config.normalize,
            cache_dir,
        }
    }
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedder {
    /// Create a new embedding model with the given name.
    ///
    /// The model will be downloaded on first use if not cached.
    /// Model files are kept directly in `cache_dir`.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        let model_enum = parse_model_name(model_name)?;

        std::fs::create_dir_all(&cache_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = Self::detect_dimensions(&mut model)?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    /// Get the embedding dimensions for this model
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Probe the model to determine embedding dimensions.
    fn detect_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::InitFailed(format!("Failed to detect dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }
}

impl Embedder for FastEmbedder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
    }
}

/// Parse model name string to fastembed enum.
pub fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l6-v2-q" | "allminiml6v2q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
        "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-small-en-v1.5-q" | "bgesmallenv15q" => Ok(fastembed::EmbeddingModel::BGESmallENV15Q),
        "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-base-en-v1.5-q" | "bgebaseenv15q" => Ok(fastembed::EmbeddingModel::BGEBaseENV15Q),
        _ => Err(EmbeddingError::InvalidModel(format!(
            "Unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q suffix for quantized)",
            name
        ))),
    }
}

/// Compute the L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
}

/// Load-once embedding provider.
///
/// The wrapped model is built on the first call to `get_or_try_init` and
/// reused read-only for every call after that. A failed load leaves the cell
/// empty so the next call retries.
pub struct SharedEmbedder {
    options: EmbedderOptions,
    cell: OnceCell<Box<dyn Embedder>>,
}

impl SharedEmbedder {
    pub fn new(options: EmbedderOptions) -> Self {
        Self {
            options,
            cell: OnceCell::new(),
        }
    }

    /// Provider that is already loaded with `embedder`; the fastembed model is never touched.
    pub fn with_embedder(embedder: Box<dyn Embedder>, normalize: bool) -> Self {
        let options = EmbedderOptions {
            model: embedder.name().to_string(),
            normalize,
            cache_dir: PathBuf::new(),
        };
        Self {
            options,
            cell: OnceCell::with_value(embedder),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Access the underlying model, loading it if this is the first use.
    pub fn get_or_try_init(&self) -> Result<&dyn Embedder, EmbeddingError> {
        let embedder = self.cell.get_or_try_init(|| {
            log::info!("Loading embedding model '{}'", self.options.model);
            let model = FastEmbedder::new(&self.options.model, self.options.cache_dir.clone())?;
            log::info!(
                "Model '{}' ready ({} dimensions)",
                self.options.model,
                model.dimensions()
            );
            Ok::<Box<dyn Embedder>, EmbeddingError>(Box::new(model))
        })?;

        Ok(&**embedder)
    }
}

impl Embedder for SharedEmbedder {
    fn name(&self) -> &str {
        &self.options.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = self.get_or_try_init()?.embed(text)?;
        if self.options.normalize {
            normalize(&mut vector);
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = self.get_or_try_init()?.embed_batch(texts)?;
        if self.options.normalize {
            vectors.iter_mut().for_each(|v| normalize(v));
        }
        Ok(vectors)
    }
}

static PROCESS_EMBEDDER: OnceCell<Arc<SharedEmbedder>> = OnceCell::new();

/// Process-wide embedding provider.
///
/// The first caller's options win; later callers get the same handle.
pub fn shared_embedder(options: EmbedderOptions) -> Arc<SharedEmbedder> {
    PROCESS_EMBEDDER
        .get_or_init(|| Arc::new(SharedEmbedder::new(options)))
        .clone()
}
