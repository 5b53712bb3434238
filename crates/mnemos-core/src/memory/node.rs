//! Memory Node: the core persisted unit of the knowledge graph.

use super::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of experience a memory records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Procedural,
    Emotional,
    Conversation,
    Goal,
    General,
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoryType::Episodic => "episodic",
            MemoryType::Semantic => "semantic",
            MemoryType::Procedural => "procedural",
            MemoryType::Emotional => "emotional",
            MemoryType::Conversation => "conversation",
            MemoryType::Goal => "goal",
            MemoryType::General => "general",
        };
        f.write_str(s)
    }
}

impl FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "episodic" => Ok(MemoryType::Episodic),
            "semantic" => Ok(MemoryType::Semantic),
            "procedural" => Ok(MemoryType::Procedural),
            "emotional" => Ok(MemoryType::Emotional),
            "conversation" => Ok(MemoryType::Conversation),
            "goal" => Ok(MemoryType::Goal),
            "general" => Ok(MemoryType::General),
            other => Err(format!("unknown memory_type '{other}'")),
        }
    }
}

/// Retrieval tier. Governs decay rate and retrieval priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Working,
    ShortTerm,
    LongTerm,
    Core,
    Archived,
}

impl Layer {
    /// Days⁻¹ decay rate used by the retrieval engine's recency component.
    pub fn decay_rate(self) -> f64 {
        match self {
            Layer::Working => 0.0,
            Layer::ShortTerm => 0.03,
            Layer::LongTerm => 0.05,
            Layer::Core => 0.0,
            Layer::Archived => 0.0,
        }
    }

    /// Retrieval priority on a 0-100 scale; `layer_boost = priority / 100`.
    pub fn retrieval_priority(self) -> f64 {
        match self {
            Layer::Core => 100.0,
            Layer::Working => 90.0,
            Layer::ShortTerm => 70.0,
            Layer::LongTerm => 50.0,
            Layer::Archived => 10.0,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Layer::Working => "working",
            Layer::ShortTerm => "short_term",
            Layer::LongTerm => "long_term",
            Layer::Core => "core",
            Layer::Archived => "archived",
        };
        f.write_str(s)
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "working" => Ok(Layer::Working),
            "short_term" => Ok(Layer::ShortTerm),
            "long_term" => Ok(Layer::LongTerm),
            "core" => Ok(Layer::Core),
            "archived" => Ok(Layer::Archived),
            other => Err(format!("unknown layer '{other}'")),
        }
    }
}

/// Primary emotion classification plus intensity, attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalValence {
    pub primary_emotion: String,
    pub intensity: f32,
    pub secondary_emotions: Vec<String>,
    /// (#positive - #negative) / #matched, in [-1, 1].
    pub sentiment: f32,
}

impl Default for EmotionalValence {
    fn default() -> Self {
        Self {
            primary_emotion: "neutral".to_string(),
            intensity: 0.5,
            secondary_emotions: Vec::new(),
            sentiment: 0.0,
        }
    }
}

/// The core persisted unit of the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct MemoryNode {
    pub id: String,
    pub content: String,
    pub memory_type: MemoryType,
    pub layer: Layer,

    pub created_at: DateTime<Utc>,
    pub conversation_date: DateTime<Utc>,
    pub event_date: Option<DateTime<Utc>>,

    pub importance: f32,
    pub confidence: f32,

    pub is_latest: bool,
    pub is_static: bool,
    pub superseded_by: Option<String>,
    pub goal_id: Option<String>,

    pub container_tags: Vec<String>,
    pub user_id: String,

    pub access_count: u64,
    pub useful_retrievals: u64,
    pub total_retrievals: u64,
    pub last_accessed: Option<DateTime<Utc>>,

    pub emotional_valence: EmotionalValence,
    pub entities: Vec<String>,
    pub topics: Vec<String>,

    pub metadata: Metadata,
}

/// Fields a caller supplies to create a node; the rest are derived or
/// defaulted by the facade.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct IngestInput {
    pub content: String,
    pub memory_type: Option<MemoryType>,
    pub container_tags: Vec<String>,
    pub user_id: String,
    pub source: Option<String>,
    pub conversation_date: Option<DateTime<Utc>>,
    pub event_date: Option<DateTime<Utc>>,
    pub goal_id: Option<String>,
}

impl MemoryNode {
    /// `embedding` length must equal `D`; that invariant is enforced by the
    /// caller (Storage/VectorIndex), not here — this constructor only fixes
    /// the node's own fields and defaults.
    pub fn new(id: String, input: IngestInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            content: input.content,
            memory_type: input.memory_type.unwrap_or(MemoryType::General),
            layer: Layer::Working,
            created_at: now,
            conversation_date: input.conversation_date.unwrap_or(now),
            event_date: input.event_date,
            importance: 0.5,
            confidence: 1.0,
            is_latest: true,
            is_static: false,
            superseded_by: None,
            goal_id: input.goal_id,
            container_tags: input.container_tags,
            user_id: input.user_id,
            access_count: 0,
            useful_retrievals: 0,
            total_retrievals: 0,
            last_accessed: None,
            emotional_valence: EmotionalValence::default(),
            entities: Vec::new(),
            topics: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn clamp_scores(&mut self) {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self.importance = self.importance.clamp(0.0, 1.0);
    }

    pub fn utility(&self) -> f64 {
        if self.total_retrievals > 0 {
            self.useful_retrievals as f64 / self.total_retrievals as f64
        } else {
            0.5
        }
    }

    pub fn was_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.event_date.map(|d| d <= at).unwrap_or(true)
    }
}
