//! Conversation sessions. Membership is recorded via node metadata
//! (`session_id`), not a join table — the session row itself only tracks
//! the session's own span and type.

use super::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Session {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub session_type: String,
    pub metadata: Metadata,
}

impl Session {
    pub fn new(id: String, session_type: String) -> Self {
        Self {
            id,
            start: Utc::now(),
            end: None,
            session_type,
            metadata: Metadata::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }
}
