//! # Mnemos Core
//!
//! Embedded memory engine for conversational AI agents: a single-file
//! SQLite store plus a vector index, wired together by a facade that
//! extracts structured facts, detects contradictions between them, tracks
//! goal progress, and serves hybrid (vector + keyword + fact + goal)
//! retrieval behind one `MemoryClient`.
//!
//! ## Modules
//!
//! - [`memory`]: the shared data model (nodes, edges, facts, entities, goal
//!   clusters, sessions).
//! - [`storage`]: the SQLite-backed Storage Engine.
//! - [`embeddings`]: the `EmbeddingProvider` contract and vector math.
//! - [`search`]: the Vector Index (HNSW or exhaustive) and keyword scorer.
//! - [`extraction`]: the deterministic fact/entity/temporal/valence pipeline.
//! - [`contradiction`]: the Contradiction Engine.
//! - [`goals`]: the Goal Clustering registry.
//! - [`retrieval`]: the multi-strategy Retrieval Engine.
//! - [`client`]: `MemoryClient`, the facade composing all of the above.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mnemos_core::{Config, IngestInput, MemoryClient};
//! use std::sync::Arc;
//!
//! # async fn run(provider: Arc<dyn mnemos_core::EmbeddingProvider>) -> mnemos_core::Result<()> {
//! let config = Config::default();
//! let client = MemoryClient::new(config, None, provider).await?;
//!
//! let outcome = client
//!     .store_memory_with_conflict_detection(IngestInput {
//!         user_id: "user-1".to_string(),
//!         content: "I live in Austin now".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let results = client
//!     .retrieve_context("where do I live", "user-1", 5)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `embeddings` (default): local embedding generation via `fastembed`.
//! - `vector-search` (default): HNSW vector search via `usearch`; without
//!   it, `Config::vector_index` may only be `Linear`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod client;
pub mod config;
pub mod contradiction;
pub mod error;
pub mod goals;
pub mod memory;
pub mod retrieval;
pub mod storage;

pub mod embeddings;
pub mod search;

pub mod extraction;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Top-level facade
pub use client::{MemoryClient, StoreOutcome};

// Configuration
pub use config::{Config, HnswParams, StorageLocation, VectorIndexKind};

// Errors
pub use error::{MemoryError, Result};

// Memory data model
pub use memory::{
    DeleteMode, Edge, EdgeType, EmotionalValence, EntityType, Fact, GoalCluster, IngestInput,
    Layer, Metadata, MetadataValue, MemoryNode, MemoryStats, MemoryType, PredicateCategory,
    Session, TrackedEntity, Trend, ValenceSample,
};

// Storage layer
pub use storage::{resolve_storage_path, QueryFilters, Storage, StorageError};

// Embeddings
pub use embeddings::{cosine_similarity, euclidean_distance, normalize, EmbeddingError, EmbeddingProvider};
#[cfg(feature = "embeddings")]
pub use embeddings::LocalEmbeddingProvider;

// Search / vector index
pub use search::{keyword_overlap_score, LinearIndex, VectorIndex, VectorSearchError};
#[cfg(feature = "vector-search")]
pub use search::HnswIndex;

// Extraction pipeline
pub use extraction::{
    extract, extract_entities, extract_facts, extract_temporal, extract_valence, ExtractedEntity,
    ExtractedFact, ExtractionResult, Granularity, TemporalInfo, TemporalType,
};

// Contradiction engine
pub use contradiction::{ContradictionResult, ContradictionType, Resolution};

// Goal clustering
pub use goals::{CoachingContext, GoalRegistry, LinkClassification, LinkResult};

// Retrieval engine
pub use retrieval::{QueryType, RetrievalResponse, RetrievalSnapshot, ScoreBreakdown, ScoredResult};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        Config, Edge, EdgeType, Fact, GoalCluster, IngestInput, MemoryClient, MemoryError,
        MemoryNode, MemoryStats, MemoryType, Result, Session, StoreOutcome,
    };

    #[cfg(feature = "embeddings")]
    pub use crate::{EmbeddingProvider, LocalEmbeddingProvider};
    #[cfg(not(feature = "embeddings"))]
    pub use crate::EmbeddingProvider;

    #[cfg(feature = "vector-search")]
    pub use crate::HnswIndex;
    pub use crate::{LinearIndex, VectorIndex};

    pub use crate::{ContradictionResult, ContradictionType, Resolution};
    pub use crate::{CoachingContext, GoalRegistry, LinkClassification};
    pub use crate::{QueryType, RetrievalResponse};
}
