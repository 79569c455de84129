//! Top-K ranking of stored notes against a query.
//!
//! Notes without an embedding are left out of the ranking entirely. Stored
//! vectors are decoded into one matrix and scored with a single batched
//! similarity call.

use serde::Serialize;

use crate::notes::{Note, NoteStore, StoreError};
use crate::semantic::codec::{self, CodecError};
use crate::semantic::embeddings::{Embedder, EmbeddingError};
use crate::semantic::similarity::cosine_similarity_batch;

/// A note paired with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredNote {
    #[serde(flatten)]
    pub note: Note,
    pub score: f32,
}

/// Result of ranking, keeping apart the reasons for an empty answer.
#[derive(Debug, Clone)]
pub enum RankingOutcome {
    /// The store holds no notes at all.
    EmptyArchive,
    /// Notes exist but none carries a usable embedding.
    NoEmbeddings,
    Ranked(Vec<ScoredNote>),
}

impl RankingOutcome {
    pub fn into_results(self) -> Vec<ScoredNote> {
        match self {
            RankingOutcome::Ranked(results) => results,
            RankingOutcome::EmptyArchive | RankingOutcome::NoEmbeddings => vec![],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Find the `k` notes most similar to `query`, best first.
pub fn find_top_k(
    embedder: &dyn Embedder,
    store: &dyn NoteStore,
    query: &str,
    k: usize,
) -> Result<Vec<ScoredNote>, RankingError> {
    Ok(rank(embedder, store, query, k)?.into_results())
}

/// Same as [`find_top_k`], but reports why nothing was ranked.
pub fn rank(
    embedder: &dyn Embedder,
    store: &dyn NoteStore,
    query: &str,
    k: usize,
) -> Result<RankingOutcome, RankingError> {
    let query_vector = embedder.embed(query)?;
    let notes = store.list_all()?;
    rank_notes(&query_vector, notes, k)
}

/// Rank already-fetched notes against an embedded query.
///
/// `notes` must be in ascending id order; equal scores keep that order.
pub fn rank_notes(
    query_vector: &[f32],
    notes: Vec<Note>,
    k: usize,
) -> Result<RankingOutcome, RankingError> {
    if notes.is_empty() {
        return Ok(RankingOutcome::EmptyArchive);
    }

    let expected_len = query_vector.len() * std::mem::size_of::<f32>();

    let candidates: Vec<Note> = notes
        .into_iter()
        .filter(|note| match &note.embedding {
            None => false,
            Some(bytes) if bytes.len() != expected_len => {
                log::warn!(
                    "note {} has a {}-byte embedding, expected {}; skipping",
                    note.id,
                    bytes.len(),
                    expected_len
                );
                false
            }
            Some(_) => true,
        })
        .collect();

    if candidates.is_empty() {
        return Ok(RankingOutcome::NoEmbeddings);
    }

    let matrix = codec::decode_batch(
        candidates
            .iter()
            .filter_map(|note| note.embedding.as_deref()),
    )?;

    let scores = cosine_similarity_batch(query_vector, &matrix);
    log::debug!("scored {} notes", scores.len());

    let mut ranked: Vec<ScoredNote> = candidates
        .into_iter()
        .zip(scores)
        .map(|(note, score)| ScoredNote { note, score })
        .collect();

    // sort_by is stable, ties keep ascending id
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(k);

    Ok(RankingOutcome::Ranked(ranked))
}
