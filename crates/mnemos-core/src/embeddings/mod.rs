//! Embedding provider contract and vector math.
//!
//! The provider itself is a pluggable external collaborator (§6): the core
//! only depends on the `EmbeddingProvider` trait and validates whatever
//! comes back against the configured dimension.

#[cfg(feature = "embeddings")]
mod local;

#[cfg(feature = "embeddings")]
pub use local::LocalEmbeddingProvider;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmbeddingError {
    #[error("embedding provider returned {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding provider failed: {0}")]
    Provider(String),

    #[error("embedding call timed out")]
    Timeout,

    #[error("input text exceeds maximum length of {0} characters")]
    TextTooLong(usize),
}

/// `text -> unit-vector of D floats`, the only contract the core has with
/// the external embedding model.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize;

    fn model_id(&self) -> &str;
}

/// Checks a provider's output against the configured dimension; the core
/// calls this on every embed so a misconfigured provider fails loud instead
/// of silently corrupting the vector index.
pub fn validate_dimensions(vector: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            got: vector.len(),
        });
    }
    Ok(())
}

pub fn normalize(vector: &mut [f32]) {
    let norm = (vector.iter().map(|x| x * x).sum::<f32>()).sqrt();
    if norm > 1e-12 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    dot_product(a, b)
}

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Matryoshka-style truncation: keep the first `target_dim` components and
/// re-normalize, rather than retraining a smaller model.
pub fn matryoshka_truncate(vector: &[f32], target_dim: usize) -> Vec<f32> {
    let mut truncated: Vec<f32> = vector.iter().take(target_dim).copied().collect();
    normalize(&mut truncated);
    truncated
}
