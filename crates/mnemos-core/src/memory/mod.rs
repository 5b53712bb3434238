//! Data model: memory nodes, edges, facts, entities, goal clusters,
//! sessions, and the tagged-union metadata value they all share.

mod edge;
mod entity;
mod fact;
mod goal;
mod metadata;
mod node;
mod session;

pub use edge::{DeleteMode, Edge, EdgeType};
pub use entity::{EntityType, TrackedEntity};
pub use fact::{Fact, PredicateCategory};
pub use goal::{GoalCluster, Trend, ValenceSample};
pub use metadata::{Metadata, MetadataValue};
pub use node::{EmotionalValence, IngestInput, Layer, MemoryNode, MemoryType};
pub use session::Session;

use serde::{Deserialize, Serialize};

/// Aggregate counters returned by `get_memory_stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_nodes: i64,
    pub total_edges: i64,
    pub total_facts: i64,
    pub total_entities: i64,
    pub total_goal_clusters: i64,
    pub nodes_by_layer: std::collections::HashMap<String, i64>,
}
