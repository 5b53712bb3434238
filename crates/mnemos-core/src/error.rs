//! Top-level error aggregation.

use crate::embeddings::EmbeddingError;
use crate::search::VectorSearchError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced across the facade's public API.
///
/// Each component owns its own error enum (see [`StorageError`],
/// [`VectorSearchError`], [`EmbeddingError`]); this type flattens them the
/// way a single caller-facing `Result` needs to, without hiding which layer
/// failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("vector index error: {0}")]
    VectorIndex(#[from] VectorSearchError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("operation canceled")]
    Canceled,
}

pub type Result<T> = std::result::Result<T, MemoryError>;
