//! Test client: an isolated `MemoryClient` over a temp-file database and a
//! deterministic embedding provider, for end-to-end scenarios.

use crate::mocks::HashingEmbeddingProvider;
use mnemos_core::{Config, MemoryClient, VectorIndexKind};
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_DIMENSIONS: usize = 64;

/// Owns a temp directory and a `MemoryClient` over a file-backed database
/// in it; the directory (and file) are removed when this drops.
pub struct TestClient {
    pub client: MemoryClient,
    _temp_dir: TempDir,
}

impl TestClient {
    /// Builds a client with the linear (exhaustive, exact) vector index so
    /// scenario assertions on similarity scores are deterministic and don't
    /// depend on HNSW's approximate recall.
    pub async fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let db_path = temp_dir.path().join("test_mnemos.db");

        let config = Config {
            embedding_dimensions: TEST_DIMENSIONS,
            vector_index: VectorIndexKind::Linear,
            ..Config::default()
        };
        let provider = Arc::new(HashingEmbeddingProvider::new(TEST_DIMENSIONS));
        let client = MemoryClient::new(config, Some(db_path), provider)
            .await
            .expect("failed to construct test MemoryClient");

        Self {
            client,
            _temp_dir: temp_dir,
        }
    }

    /// Re-opens a client over the same on-disk database, dropping the
    /// previous one first — used by the durability scenario.
    pub async fn reopen(self) -> Self {
        let path = self._temp_dir.path().join("test_mnemos.db");
        drop(self.client);

        let config = Config {
            embedding_dimensions: TEST_DIMENSIONS,
            vector_index: VectorIndexKind::Linear,
            ..Config::default()
        };
        let provider = Arc::new(HashingEmbeddingProvider::new(TEST_DIMENSIONS));
        let client = MemoryClient::new(config, Some(path), provider)
            .await
            .expect("failed to reopen test MemoryClient");

        Self {
            client,
            _temp_dir: self._temp_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ingest;

    #[tokio::test]
    async fn new_temp_client_starts_empty() {
        let harness = TestClient::new_temp().await;
        let stats = harness.client.get_memory_stats("u1").unwrap();
        assert_eq!(stats.total_nodes, 0);
    }

    #[tokio::test]
    async fn reopen_preserves_stored_memories() {
        let harness = TestClient::new_temp().await;
        harness
            .client
            .store_message(ingest("hello world", "u1"))
            .await
            .unwrap();

        let harness = harness.reopen().await;
        let stats = harness.client.get_memory_stats("u1").unwrap();
        assert_eq!(stats.total_nodes, 1);
    }
}
