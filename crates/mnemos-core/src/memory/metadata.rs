//! Tagged-union metadata value.
//!
//! Metadata on a node is a sum type, not a dynamically-typed map, so a
//! stored value round-trips through JSON without losing its original kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetadataValue {
    Str(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Date(DateTime<Utc>),
    Array(Vec<MetadataValue>),
    Dict(HashMap<String, MetadataValue>),
}

pub type Metadata = HashMap<String, MetadataValue>;
