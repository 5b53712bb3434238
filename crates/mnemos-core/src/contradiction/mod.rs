//! Contradiction Engine: given a new fact and the existing facts sharing
//! its subject, decides whether it contradicts, extends, duplicates, or is
//! unrelated to them, and what to do about it.

use crate::memory::{Fact, PredicateCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionType {
    None,
    Direct,
    Implied,
    Temporal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    NewSupersedes,
    KeepExisting,
    Coexist,
    NeedsUserInput,
    None,
}

#[derive(Debug, Clone)]
pub struct ContradictionResult {
    pub contradiction_type: ContradictionType,
    pub existing: Option<Fact>,
    pub new: Option<Fact>,
    pub resolution: Resolution,
    pub confidence: f32,
}

impl ContradictionResult {
    fn none() -> Self {
        Self {
            contradiction_type: ContradictionType::None,
            existing: None,
            new: None,
            resolution: Resolution::None,
            confidence: 1.0,
        }
    }
}

/// Closed table of predicate synonym sets. Two predicates are "related" if
/// identical or members of the same group here.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["lives_in", "resides_in", "location"],
    &["works_at", "employer", "employed_by"],
    &["job_title", "title", "profession", "role"],
    &["likes", "favorite", "prefers"],
    &["dislikes", "avoids"],
    &["birthday", "date_of_birth", "dob"],
    &["age"],
    &["name"],
    &["partner", "spouse", "married_to"],
    &["parent", "mother", "father"],
];

fn predicates_related(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    SYNONYM_GROUPS
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

const CITY_ALIASES: &[&[&str]] = &[&["nyc", "new york", "new york city"], &["sf", "san francisco"]];

fn aliased_equivalent(a: &str, b: &str) -> bool {
    CITY_ALIASES
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

fn substring_overlap_ratio(a: &str, b: &str) -> f32 {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return 0.0;
    }
    if longer.contains(shorter) {
        shorter.len() as f32 / longer.len() as f32
    } else {
        0.0
    }
}

fn objects_equivalent(a: &str, b: &str) -> bool {
    let (na, nb) = (a.trim().to_lowercase(), b.trim().to_lowercase());
    if na == nb {
        return true;
    }
    if aliased_equivalent(&na, &nb) {
        return true;
    }
    substring_overlap_ratio(&na, &nb) > 0.7
}

/// Runs the full decision procedure against every existing fact sharing the
/// new fact's normalized subject, returning the first contradiction found
/// (existing facts are assumed pre-filtered to the same subject and user).
pub fn check(new_fact: &Fact, existing_facts_same_user: &[Fact]) -> ContradictionResult {
    let candidates: Vec<&Fact> = existing_facts_same_user
        .iter()
        .filter(|f| f.subject == new_fact.subject && f.is_latest)
        .collect();

    for existing in candidates {
        if !predicates_related(&existing.predicate, &new_fact.predicate) {
            continue;
        }
        if !existing.predicate_category.is_mutually_exclusive()
            && !matches!(existing.predicate_category, PredicateCategory::Attribute)
        {
            // Non-exclusive categories (preferences, habits, ...) may coexist.
            continue;
        }
        if objects_equivalent(&existing.object, &new_fact.object) {
            continue;
        }

        let contradiction_type = if existing.predicate == new_fact.predicate {
            ContradictionType::Direct
        } else {
            ContradictionType::Implied
        };

        let resolution = resolve(existing, new_fact);
        let confidence = score_confidence(existing, new_fact);

        return ContradictionResult {
            contradiction_type,
            existing: Some(existing.clone()),
            new: Some(new_fact.clone()),
            resolution,
            confidence,
        };
    }

    ContradictionResult::none()
}

fn resolve(existing: &Fact, new_fact: &Fact) -> Resolution {
    match (existing.valid_from, new_fact.valid_from) {
        (Some(old_from), Some(new_from)) => {
            if new_from > old_from {
                Resolution::NewSupersedes
            } else {
                Resolution::KeepExisting
            }
        }
        (None, Some(_)) => Resolution::NewSupersedes,
        _ => {
            if existing.confidence > new_fact.confidence + 0.2 {
                Resolution::KeepExisting
            } else {
                Resolution::NewSupersedes
            }
        }
    }
}

fn score_confidence(existing: &Fact, new_fact: &Fact) -> f32 {
    let mut confidence: f32 = 0.5;
    if existing.predicate == new_fact.predicate {
        confidence += 0.2;
    }
    if matches!(
        existing.predicate_category,
        PredicateCategory::Location | PredicateCategory::Attribute
    ) {
        confidence += 0.15;
    }
    confidence += (new_fact.confidence + existing.confidence) / 10.0;
    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fact(subject: &str, predicate: &str, object: &str, category: PredicateCategory, confidence: f32) -> Fact {
        Fact {
            id: uuid::Uuid::new_v4().to_string(),
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            predicate_category: category,
            confidence,
            source_memory_id: "m1".to_string(),
            valid_from: None,
            valid_until: None,
            detection_method: "regex".to_string(),
            user_id: "u1".to_string(),
            is_latest: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn direct_contradiction_on_location_supersedes() {
        let existing = fact("user", "lives_in", "NYC", PredicateCategory::Location, 0.9);
        let new_fact = fact("user", "lives_in", "San Francisco", PredicateCategory::Location, 0.9);

        let result = check(&new_fact, &[existing]);
        assert_eq!(result.contradiction_type, ContradictionType::Direct);
        assert_eq!(result.resolution, Resolution::NewSupersedes);
    }

    #[test]
    fn preferences_coexist_without_contradiction() {
        let existing = fact("user", "likes", "running", PredicateCategory::Preference, 0.85);
        let new_fact = fact("user", "likes", "swimming", PredicateCategory::Preference, 0.85);

        let result = check(&new_fact, &[existing]);
        assert_eq!(result.contradiction_type, ContradictionType::None);
        assert_eq!(result.resolution, Resolution::None);
    }

    #[test]
    fn aliased_city_objects_are_equivalent_not_contradictory() {
        let existing = fact("user", "lives_in", "NYC", PredicateCategory::Location, 0.9);
        let new_fact = fact("user", "lives_in", "New York", PredicateCategory::Location, 0.9);

        let result = check(&new_fact, &[existing]);
        assert_eq!(result.contradiction_type, ContradictionType::None);
    }

    #[test]
    fn low_confidence_new_fact_keeps_existing() {
        let existing = fact("user", "lives_in", "NYC", PredicateCategory::Location, 0.95);
        let new_fact = fact("user", "lives_in", "Chicago", PredicateCategory::Location, 0.5);

        let result = check(&new_fact, &[existing]);
        assert_eq!(result.resolution, Resolution::KeepExisting);
    }
}
