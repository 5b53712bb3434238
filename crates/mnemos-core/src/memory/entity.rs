//! Tracked entities (people, places, organizations, ...) mentioned in memories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Person,
    Place,
    Organization,
    Date,
    Goal,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Person => "person",
            EntityType::Place => "place",
            EntityType::Organization => "organization",
            EntityType::Date => "date",
            EntityType::Goal => "goal",
        };
        f.write_str(s)
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "person" => EntityType::Person,
            "place" => EntityType::Place,
            "organization" => EntityType::Organization,
            "date" => EntityType::Date,
            "goal" => EntityType::Goal,
            other => return Err(format!("unknown entity type '{other}'")),
        })
    }
}

/// Uniqueness: `(normalized_name, type, user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TrackedEntity {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
    pub entity_type: EntityType,
    pub aliases: Vec<String>,
    pub first_mentioned: DateTime<Utc>,
    pub mention_count: u64,
    pub related_fact_ids: Vec<String>,
    pub user_id: String,
}

impl TrackedEntity {
    pub fn normalize(name: &str) -> String {
        name.trim().to_lowercase()
    }
}
