use crate::{
    config::ConfigError,
    ingest::IngestError,
    notes::StoreError,
    semantic::{codec::CodecError, EmbeddingError, RankingError},
};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("note {0} not found")]
    NotFound(u64),

    #[error("note content is empty")]
    EmptyNote,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
}

impl From<RankingError> for AppError {
    fn from(err: RankingError) -> Self {
        match err {
            RankingError::Embedding(e) => AppError::Embedding(e),
            RankingError::Store(e) => AppError::Store(e),
            RankingError::Codec(e) => AppError::Codec(e),
        }
    }
}
