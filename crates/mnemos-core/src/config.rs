//! Engine configuration.
//!
//! `Config` is a plain, `serde`-deserializable value; this crate never reads
//! it from disk or environment itself (sourcing it is a host-application
//! concern), it only interprets the fields once constructed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which vector index implementation backs similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorIndexKind {
    /// Exhaustive cosine scan. O(N*D) but exact.
    Linear,
    /// Hierarchical navigable small world ANN index.
    Hnsw,
}

impl Default for VectorIndexKind {
    fn default() -> Self {
        VectorIndexKind::Hnsw
    }
}

/// Where the database file lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum StorageLocation {
    Documents,
    ApplicationSupport,
    Caches,
    Custom(PathBuf),
}

impl Default for StorageLocation {
    fn default() -> Self {
        StorageLocation::ApplicationSupport
    }
}

/// HNSW construction/search parameters, used only when
/// `vector_index == Hnsw`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HnswParams {
    pub m: usize,
    pub ef_construction: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct Config {
    /// Must equal the embedding provider's `dimensions()`.
    pub embedding_dimensions: usize,

    pub vector_index: VectorIndexKind,
    pub hnsw: HnswParams,

    /// Minimum similarity for a vector candidate to be considered at all.
    pub similarity_threshold: f32,

    /// Minimum similarity for an automatic `similar_to` edge to be created.
    pub auto_link_similarity_threshold: f32,

    /// Relative weight retrieval gives to recency versus other components.
    /// Present for host tuning; the retrieval engine's per-query-type
    /// weight table in `retrieval` is the default source of truth.
    pub recency_weight: f32,
    /// Decay rate (days⁻¹) applied to a `long_term`/`short_term` layer node.
    pub recency_decay_factor: f32,

    pub default_top_k: usize,
    pub default_max_results: usize,
    pub max_graph_depth: usize,
    pub min_edge_weight: f32,

    pub storage_location: StorageLocation,

    /// Upper bound, in seconds, on a single retrieval call.
    pub max_query_time_secs: u64,

    /// Minimum confidence an extracted entity must carry to be persisted.
    pub entity_extraction_confidence: f32,

    /// Cap on concurrent embedding calls during batch ingest.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_dimensions: 256,
            vector_index: VectorIndexKind::default(),
            hnsw: HnswParams::default(),
            similarity_threshold: 0.7,
            auto_link_similarity_threshold: 0.8,
            recency_weight: 0.2,
            recency_decay_factor: 0.05,
            default_top_k: 10,
            default_max_results: 50,
            max_graph_depth: 3,
            min_edge_weight: 0.1,
            storage_location: StorageLocation::default(),
            max_query_time_secs: 5,
            entity_extraction_confidence: 0.6,
            batch_size: 16,
        }
    }
}

impl Config {
    /// File name used under `storage_location` unless a `Custom` path is
    /// already a full file path. Kept as an external contract: host backup
    /// tools key off this prefix.
    pub fn default_file_name(user_id: &str) -> String {
        format!("swiftmem_{user_id}.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_internally_consistent() {
        let cfg = Config::default();
        assert!(cfg.similarity_threshold <= cfg.auto_link_similarity_threshold);
        assert!(cfg.embedding_dimensions > 0);
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{"embedding_dimensions": 256, "bogus": true}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }
}
