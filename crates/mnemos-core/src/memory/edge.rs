//! Graph edges between memory nodes.

use super::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Related,
    Updates,
    Extends,
    Supersedes,
    Derives,
    FollowedBy,
    Precedes,
    Causes,
    PartOf,
    Contains,
    SubtopicOf,
    SimilarTo,
    OppositeOf,
    Mentions,
    SameSession,
    References,
    ProgressToward,
    BlockerFor,
    MotivationFor,
    InsightAbout,
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeType::Related => "related",
            EdgeType::Updates => "updates",
            EdgeType::Extends => "extends",
            EdgeType::Supersedes => "supersedes",
            EdgeType::Derives => "derives",
            EdgeType::FollowedBy => "followed_by",
            EdgeType::Precedes => "precedes",
            EdgeType::Causes => "causes",
            EdgeType::PartOf => "part_of",
            EdgeType::Contains => "contains",
            EdgeType::SubtopicOf => "subtopic_of",
            EdgeType::SimilarTo => "similar_to",
            EdgeType::OppositeOf => "opposite_of",
            EdgeType::Mentions => "mentions",
            EdgeType::SameSession => "same_session",
            EdgeType::References => "references",
            EdgeType::ProgressToward => "progress_toward",
            EdgeType::BlockerFor => "blocker_for",
            EdgeType::MotivationFor => "motivation_for",
            EdgeType::InsightAbout => "insight_about",
        };
        f.write_str(s)
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "related" => EdgeType::Related,
            "updates" => EdgeType::Updates,
            "extends" => EdgeType::Extends,
            "supersedes" => EdgeType::Supersedes,
            "derives" => EdgeType::Derives,
            "followed_by" => EdgeType::FollowedBy,
            "precedes" => EdgeType::Precedes,
            "causes" => EdgeType::Causes,
            "part_of" => EdgeType::PartOf,
            "contains" => EdgeType::Contains,
            "subtopic_of" => EdgeType::SubtopicOf,
            "similar_to" => EdgeType::SimilarTo,
            "opposite_of" => EdgeType::OppositeOf,
            "mentions" => EdgeType::Mentions,
            "same_session" => EdgeType::SameSession,
            "references" => EdgeType::References,
            "progress_toward" => EdgeType::ProgressToward,
            "blocker_for" => EdgeType::BlockerFor,
            "motivation_for" => EdgeType::MotivationFor,
            "insight_about" => EdgeType::InsightAbout,
            other => return Err(format!("unknown edge type '{other}'")),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Edge {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub relationship_type: EdgeType,
    pub weight: f32,
    pub created_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl Edge {
    pub fn new(id: String, from_id: String, to_id: String, relationship_type: EdgeType) -> Self {
        Self {
            id,
            from_id,
            to_id,
            relationship_type,
            weight: 1.0,
            created_at: Utc::now(),
            metadata: Metadata::new(),
        }
    }
}

/// How `delete_node` treats a node's edges.
///
/// `edges.from_id`/`edges.to_id` both carry `ON DELETE CASCADE`, so deleting
/// a node already removes every edge that touches it, in either direction —
/// there is no way to delete a node while leaving a dangling edge behind.
/// All four variants therefore resolve to the same storage-layer behavior;
/// the enum is kept so callers can still state their intent at the call
/// site, and so a future storage layer that wants to special-case one
/// direction (e.g. preserving incoming edges as "this used to point here")
/// has somewhere to hang that distinction without an API change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    NodeOnly,
    Cascade,
    NodeAndOutgoing,
    NodeAndIncoming,
}
