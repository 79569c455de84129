//! Embedding-backed similarity search for notes.
//!
//! This module turns text into vectors with fastembed-rs and ranks stored
//! notes against a query by cosine similarity.
//!
//! # Architecture
//!
//! - `embeddings`: Wraps fastembed behind the `Embedder` trait, loaded once per process
//! - `codec`: Raw little-endian byte layout for stored vectors
//! - `similarity`: Single and batched cosine similarity
//! - `chunker`: Word-boundary chunking of long documents
//! - `ranking`: Top-K search over the note store

pub mod chunker;
pub mod codec;
pub mod embeddings;
pub mod ranking;
pub mod similarity;

pub use chunker::{chunk_text, DEFAULT_CHUNK_SIZE};
pub use embeddings::{shared_embedder, Embedder, EmbedderOptions, EmbeddingError, SharedEmbedder};
pub use ranking::{find_top_k, rank, RankingError, RankingOutcome, ScoredNote};
pub use similarity::{cosine_similarity, cosine_similarity_batch, Matrix};
