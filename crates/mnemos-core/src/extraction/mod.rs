//! Extraction Pipeline: a deterministic, pure function of its inputs that
//! distills structured facts, entities, temporal information, and emotional
//! valence from a single input string. Internally infallible — no network,
//! no I/O — so callers never need to handle an extraction error; per the
//! propagation policy, any downstream linking failure is the caller's to
//! log, not extraction's to surface.

mod entities;
mod facts;
mod temporal;
mod valence;

pub use entities::{extract_entities, ExtractedEntity};
pub use facts::{extract_facts, ExtractedFact};
pub use temporal::{extract_temporal, Granularity, TemporalInfo, TemporalType};
pub use valence::extract_valence;

use crate::memory::EmotionalValence;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub facts: Vec<ExtractedFact>,
    pub entities: Vec<ExtractedEntity>,
    pub temporal: TemporalInfo,
    pub valence: EmotionalValence,
}

pub fn extract(text: &str, now: DateTime<Utc>) -> ExtractionResult {
    ExtractionResult {
        facts: extract_facts(text),
        entities: extract_entities(text),
        temporal: extract_temporal(text, now),
        valence: extract_valence(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_combines_all_four_artifacts() {
        let result = extract("My goal is to run a marathon. I ran 10 miles yesterday!", Utc::now());
        assert!(!result.facts.is_empty());
        assert!(!result.entities.is_empty());
        assert!(result.temporal.event_time.is_some());
    }
}
