use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    app::errors::AppError,
    config::Config,
    ingest::{self, DefaultTextGate, TextGate},
    notes::{Note, NoteCreate, NoteStore},
    semantic::{self, codec, Embedder, EmbeddingError, RankingOutcome, SharedEmbedder},
};

/// Chunks embedded per model call during ingestion
const INGEST_BATCH_SIZE: usize = 32;

/// Summary of one file ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source_file: String,
    pub notes_created: usize,
}

pub struct AppService {
    config: Config,
    store: Box<dyn NoteStore>,
    embedder: Arc<SharedEmbedder>,
    text_gate: Box<dyn TextGate>,
}

impl AppService {
    pub fn new(config: Config, store: Box<dyn NoteStore>, embedder: Arc<SharedEmbedder>) -> Self {
        Self {
            config,
            store,
            embedder,
            text_gate: Box::new(DefaultTextGate),
        }
    }

    /// Replace the policy deciding which files `ingest_file` accepts.
    #[cfg(test)]
    pub fn with_text_gate(mut self, text_gate: Box<dyn TextGate>) -> Self {
        self.text_gate = text_gate;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Embed and store a new note.
    pub fn add_note(&self, content: &str) -> Result<Note, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::EmptyNote);
        }

        let embedding = self.embedder.embed(content)?;
        let note = self.store.insert(NoteCreate {
            content: content.to_string(),
            embedding: Some(codec::encode(&embedding)),
            source_file: None,
        })?;

        log::info!("added note {}", note.id);
        Ok(note)
    }

    pub fn delete_note(&self, id: u64) -> Result<(), AppError> {
        if !self.store.delete(id)? {
            return Err(AppError::NotFound(id));
        }

        log::info!("deleted note {id}");
        Ok(())
    }

    pub fn list_notes(&self) -> Result<Vec<Note>, AppError> {
        Ok(self.store.list_all()?)
    }

    pub fn get_note(&self, id: u64) -> Result<Note, AppError> {
        self.store.get(id)?.ok_or(AppError::NotFound(id))
    }

    /// Rank stored notes against `query`. `top` falls back to the configured `top_k`.
    pub fn find(&self, query: &str, top: Option<usize>) -> Result<RankingOutcome, AppError> {
        let k = top.unwrap_or(self.config.top_k);
        Ok(semantic::rank(
            self.embedder.as_ref(),
            self.store.as_ref(),
            query,
            k,
        )?)
    }

    /// Read a text file, split it into chunks and store every chunk as a note.
    ///
    /// Chunks are embedded in batches of `INGEST_BATCH_SIZE`; `on_progress`
    /// is called with `(embedded, total)` once before the first batch and
    /// after every batch. All notes are written in a single store update, so
    /// a failure leaves the archive unchanged.
    pub fn ingest_file(
        &self,
        path: &Path,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<IngestReport, AppError> {
        let text = ingest::read_text(path, self.text_gate.as_ref())?;

        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let chunks = if text.trim().is_empty() {
            vec![]
        } else {
            semantic::chunk_text(&text, self.config.chunk_size)
        };

        log::info!("ingesting {} as {} chunk(s)", source_file, chunks.len());
        on_progress(0, chunks.len());

        let mut note_creates = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(INGEST_BATCH_SIZE) {
            let embeddings = self.embedder.embed_batch(batch)?;
            if embeddings.len() != batch.len() {
                return Err(AppError::Embedding(EmbeddingError::EmbeddingFailed(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                ))));
            }

            note_creates.extend(batch.iter().zip(embeddings).map(|(chunk, embedding)| {
                NoteCreate {
                    content: chunk.clone(),
                    embedding: Some(codec::encode(&embedding)),
                    source_file: Some(source_file.clone()),
                }
            }));
            on_progress(note_creates.len(), chunks.len());
        }

        let notes = self.store.insert_many(note_creates)?;

        Ok(IngestReport {
            source_file,
            notes_created: notes.len(),
        })
    }
}
