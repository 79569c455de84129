mod notes;

use std::path::Path;
use std::sync::Arc;

use crate::{
    app::service::AppService,
    config::Config,
    notes::BackendCsv,
    semantic::{Embedder, EmbeddingError, SharedEmbedder},
};

pub const FAKE_DIMS: usize = 16;

const STOPWORDS: &[&str] = &["the", "on", "are", "and", "a"];

/// Deterministic bag-of-words embedder with a tiny synonym map.
///
/// Known words land on fixed slots 0..8, everything else hashes into 8..16.
pub struct BagOfWords;

impl BagOfWords {
    fn slot(word: &str) -> usize {
        match word {
            "cat" | "cats" | "kitten" | "kittens" | "feline" => 0,
            "dog" | "dogs" => 1,
            "mat" => 2,
            "loyal" => 3,
            "animal" | "animals" => 4,
            "behavior" => 5,
            "pattern" | "patterns" => 6,
            "sat" => 7,
            other => {
                // FNV-1a
                let hash = other.bytes().fold(0xcbf29ce484222325u64, |h, b| {
                    (h ^ b as u64).wrapping_mul(0x100000001b3)
                });
                8 + (hash % 8) as usize
            }
        }
    }
}

impl Embedder for BagOfWords {
    fn name(&self) -> &str {
        "bag-of-words"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0; FAKE_DIMS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            if STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            vector[Self::slot(&word)] += 1.0;
        }
        Ok(vector)
    }
}

pub fn fake_embedder() -> Arc<SharedEmbedder> {
    Arc::new(SharedEmbedder::with_embedder(Box::new(BagOfWords), true))
}

/// Archive service over `dir` backed by the fake embedder.
pub fn archive_at(dir: &Path) -> AppService {
    let config = Config::load_with(dir).unwrap();
    let store = BackendCsv::load(dir).unwrap();
    AppService::new(config, Box::new(store), fake_embedder())
}
