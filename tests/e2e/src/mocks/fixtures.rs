//! Test data factory and a deterministic embedding provider for end-to-end
//! scenarios that need genuinely similar vectors for similar text, without
//! depending on a real model download.

use async_trait::async_trait;
use mnemos_core::{normalize, EmbeddingError, EmbeddingProvider, IngestInput};

/// Bag-of-words hashing embedding: each token hashes into a bucket of a
/// `dims`-wide vector, accumulated and re-normalized. Pure function of the
/// input text (no internal counter), so two calls on the same string always
/// return the same vector and shared vocabulary pulls vectors closer
/// together, which is what the contradiction/retrieval scenarios below rely
/// on ("San Francisco" should score closer to a later "San Francisco"
/// query than an unrelated one does).
pub struct HashingEmbeddingProvider {
    dims: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn hash_token(token: &str) -> u64 {
        // FNV-1a, good enough for deterministic test buckets.
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut v = vec![0.0f32; self.dims];
        for token in text.to_lowercase().split_whitespace() {
            let bucket = (Self::hash_token(token) as usize) % self.dims;
            v[bucket] += 1.0;
        }
        normalize(&mut v);
        if v.iter().all(|x| *x == 0.0) {
            v[0] = 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_id(&self) -> &str {
        "hashing-test-provider"
    }
}

/// Builds an `IngestInput` for `content` with the given `user_id`, leaving
/// every other field at its default.
pub fn ingest(content: &str, user_id: &str) -> IngestInput {
    IngestInput {
        content: content.to_string(),
        user_id: user_id.to_string(),
        ..Default::default()
    }
}

/// Factory for generating batches of realistic-shaped test content.
pub struct TestDataFactory;

impl TestDataFactory {
    /// `count` distinct memories for `user_id`, spread across a handful of
    /// topics so keyword/vector search has something to discriminate on.
    pub fn batch(user_id: &str, count: usize) -> Vec<IngestInput> {
        const TOPICS: &[&str] = &[
            "Rust programming uses ownership for memory safety",
            "Python is popular for data science and machine learning",
            "Mitochondria is the powerhouse of the cell",
            "To make pasta, boil water and add salt",
            "Gravity is the force of attraction between masses",
        ];

        (0..count)
            .map(|i| ingest(&format!("{} ({i})", TOPICS[i % TOPICS.len()]), user_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let provider = HashingEmbeddingProvider::new(32);
        let a = provider.embed("I live in Austin").await.unwrap();
        let b = provider.embed("I live in Austin").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher_than_unrelated() {
        let provider = HashingEmbeddingProvider::new(64);
        let base = provider.embed("I live in San Francisco now").await.unwrap();
        let similar = provider.embed("I live in San Francisco").await.unwrap();
        let unrelated = provider.embed("Chocolate cake requires cocoa and eggs").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&base, &similar) > dot(&base, &unrelated));
    }

    #[test]
    fn batch_produces_requested_count() {
        let inputs = TestDataFactory::batch("u1", 7);
        assert_eq!(inputs.len(), 7);
        assert!(inputs.iter().all(|i| i.user_id == "u1"));
    }
}
