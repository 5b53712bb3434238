//! Subject-predicate-object facts extracted from memory content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic bucket that determines contradiction behavior. `Location`,
/// `Relationship`, and `Attribute` are mutually exclusive: at most one
/// `is_latest` fact per `(subject, predicate_category, user)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateCategory {
    Location,
    Relationship,
    Preference,
    Attribute,
    State,
    Goal,
    Temporal,
    Belief,
    Habit,
}

impl PredicateCategory {
    /// Whether at most one `is_latest` fact may exist per
    /// `(subject, category, user)`.
    pub fn is_mutually_exclusive(self) -> bool {
        matches!(
            self,
            PredicateCategory::Location
                | PredicateCategory::Relationship
                | PredicateCategory::Attribute
        )
    }
}

impl fmt::Display for PredicateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PredicateCategory::Location => "location",
            PredicateCategory::Relationship => "relationship",
            PredicateCategory::Preference => "preference",
            PredicateCategory::Attribute => "attribute",
            PredicateCategory::State => "state",
            PredicateCategory::Goal => "goal",
            PredicateCategory::Temporal => "temporal",
            PredicateCategory::Belief => "belief",
            PredicateCategory::Habit => "habit",
        };
        f.write_str(s)
    }
}

impl FromStr for PredicateCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "location" => PredicateCategory::Location,
            "relationship" => PredicateCategory::Relationship,
            "preference" => PredicateCategory::Preference,
            "attribute" => PredicateCategory::Attribute,
            "state" => PredicateCategory::State,
            "goal" => PredicateCategory::Goal,
            "temporal" => PredicateCategory::Temporal,
            "belief" => PredicateCategory::Belief,
            "habit" => PredicateCategory::Habit,
            other => return Err(format!("unknown predicate category '{other}'")),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Fact {
    pub id: String,
    /// Lowercased, trimmed.
    pub subject: String,
    /// Lowercased, trimmed.
    pub predicate: String,
    /// Case preserved, trimmed.
    pub object: String,
    pub predicate_category: PredicateCategory,
    pub confidence: f32,
    pub source_memory_id: String,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub detection_method: String,
    pub user_id: String,
    pub is_latest: bool,
    pub created_at: DateTime<Utc>,
}

impl Fact {
    pub fn lookup_key(&self) -> String {
        format!("{}:{}", self.subject, self.predicate)
    }
}
