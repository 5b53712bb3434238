//! Local, on-device embedding provider backed by `fastembed` (ONNX
//! inference). One model instance is loaded lazily and shared process-wide,
//! since initializing it loads megabytes of model weights.

use super::{normalize, EmbeddingError, EmbeddingProvider};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::{Mutex, OnceLock};
use tokio::task;

/// Native output width of the default model before any Matryoshka
/// truncation is applied.
pub const NATIVE_DIMENSIONS: usize = 768;
pub const MAX_TEXT_LENGTH: usize = 8192;
pub const BATCH_SIZE: usize = 32;

fn model() -> &'static Mutex<TextEmbedding> {
    static MODEL: OnceLock<Mutex<TextEmbedding>> = OnceLock::new();
    MODEL.get_or_init(|| {
        let embedding = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::NomicEmbedTextV15).with_show_download_progress(false),
        )
        .expect("failed to initialize local embedding model");
        Mutex::new(embedding)
    })
}

/// Embeds locally via `fastembed`, optionally truncating to a smaller
/// Matryoshka dimension than the model's native output.
pub struct LocalEmbeddingProvider {
    dimensions: usize,
    model_id: String,
}

impl LocalEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            model_id: "nomic-embed-text-v1.5".to_string(),
        }
    }
}

impl Default for LocalEmbeddingProvider {
    fn default() -> Self {
        Self::new(NATIVE_DIMENSIONS)
    }
}

fn embed_blocking(texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let guard = model()
        .lock()
        .map_err(|_| EmbeddingError::Provider("embedding model lock poisoned".into()))?;
    guard
        .embed(texts, None)
        .map_err(|e| EmbeddingError::Provider(e.to_string()))
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.len() > MAX_TEXT_LENGTH {
            return Err(EmbeddingError::TextTooLong(MAX_TEXT_LENGTH));
        }
        let results = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Provider("model returned no embeddings".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let dims = self.dimensions;
        let owned = texts.to_vec();
        let raw = task::spawn_blocking(move || embed_blocking(owned))
            .await
            .map_err(|e| EmbeddingError::Provider(e.to_string()))??;

        Ok(raw
            .into_iter()
            .map(|mut v| {
                if dims < v.len() {
                    v.truncate(dims);
                }
                normalize(&mut v);
                v
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
