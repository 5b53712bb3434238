//! Fact extraction: a priority-ordered list of regex patterns, each mapping
//! a match to a `(subject, predicate, object, category, confidence)` tuple.

use crate::memory::PredicateCategory;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFact {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub category: PredicateCategory,
    pub confidence: f32,
}

const OBJECT_MIN_LEN: usize = 2;
const OBJECT_MAX_LEN: usize = 100;

fn normalize_subject(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "i" | "me" | "myself" | "user" | "the user" => "user".to_string(),
        other => other.to_string(),
    }
}

fn valid_object(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(['.', '!', '?']).trim();
    let len = trimmed.chars().count();
    if (OBJECT_MIN_LEN..=OBJECT_MAX_LEN).contains(&len) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

const PROFESSION_WORDS: &[&str] = &[
    "engineer", "developer", "teacher", "doctor", "nurse", "lawyer", "designer",
    "manager", "writer", "artist", "scientist", "student", "consultant", "analyst",
    "architect", "chef", "plumber", "electrician", "accountant", "founder",
];

struct Pattern {
    regex: LazyLock<Regex>,
    build: fn(&regex::Captures) -> Vec<ExtractedFact>,
}

macro_rules! pattern {
    ($re:expr, $build:expr) => {
        Pattern {
            regex: LazyLock::new(|| Regex::new($re).expect("valid fact pattern regex")),
            build: $build,
        }
    };
}

fn patterns() -> &'static [Pattern] {
    static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
        vec![
            pattern!(
                r"(?i)\bi (?:live|reside|stay) in ([A-Za-z][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "lives_in".into(),
                        object,
                        category: PredicateCategory::Location,
                        confidence: 0.9,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bi (?:moved|relocated) to ([A-Za-z][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "lives_in".into(),
                        object,
                        category: PredicateCategory::Location,
                        confidence: 0.85,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bi work at ([A-Za-z][A-Za-z0-9 &,.'-]*?)(?:\s+as\s+([A-Za-z][A-Za-z0-9 '-]*))?[.!]?$",
                |caps| {
                    let mut facts = Vec::new();
                    if let Some(object) = caps.get(1).and_then(|m| valid_object(m.as_str())) {
                        facts.push(ExtractedFact {
                            subject: "user".into(),
                            predicate: "works_at".into(),
                            object,
                            category: PredicateCategory::Attribute,
                            confidence: 0.9,
                        });
                    }
                    if let Some(title) = caps.get(2).and_then(|m| valid_object(m.as_str())) {
                        facts.push(ExtractedFact {
                            subject: "user".into(),
                            predicate: "job_title".into(),
                            object: title,
                            category: PredicateCategory::Attribute,
                            confidence: 0.9,
                        });
                    }
                    facts
                }
            ),
            pattern!(
                r"(?i)\bi am (?:an?\s+)?([A-Za-z][A-Za-z0-9 '-]*)[.!]?$",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    let is_profession = PROFESSION_WORDS
                        .iter()
                        .any(|w| object.to_lowercase().contains(w));
                    let predicate = if is_profession { "profession" } else { "attribute" };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: predicate.into(),
                        object,
                        category: PredicateCategory::Attribute,
                        confidence: 0.8,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bmy favorite ([A-Za-z_]+) is ([A-Za-z0-9][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[2]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: format!("favorite_{}", caps[1].to_lowercase()),
                        object,
                        category: PredicateCategory::Preference,
                        confidence: 0.9,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bi (?:like|love|enjoy|prefer) ([A-Za-z][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "likes".into(),
                        object,
                        category: PredicateCategory::Preference,
                        confidence: 0.85,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bi (?:hate|dislike|avoid) ([A-Za-z][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "dislikes".into(),
                        object,
                        category: PredicateCategory::Preference,
                        confidence: 0.85,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bmy ([A-Za-z]+)'?s? name is ([A-Za-z][A-Za-z '-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[2]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: normalize_subject(&format!("my {}", &caps[1])),
                        predicate: "name".into(),
                        object,
                        category: PredicateCategory::Relationship,
                        confidence: 0.9,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bmy birthday is ([A-Za-z0-9 ,.'-]+)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "birthday".into(),
                        object,
                        category: PredicateCategory::Attribute,
                        confidence: 0.85,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bi(?:'m| am) (\d{1,3}) years old",
                |caps| {
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "age".into(),
                        object: caps[1].to_string(),
                        category: PredicateCategory::Attribute,
                        confidence: 0.9,
                    }]
                }
            ),
            pattern!(
                r"(?i)\b(?:my goal is to|i (?:want|plan|hope|need) to|i'm (?:trying|working) to) ([A-Za-z][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "goal".into(),
                        object,
                        category: PredicateCategory::Goal,
                        confidence: 0.85,
                    }]
                }
            ),
            pattern!(
                r"(?i)\bi (?:usually|always|often) ([A-Za-z][A-Za-z0-9 ,.'-]*)",
                |caps| {
                    let Some(object) = valid_object(&caps[1]) else { return vec![] };
                    vec![ExtractedFact {
                        subject: "user".into(),
                        predicate: "habit".into(),
                        object,
                        category: PredicateCategory::Habit,
                        confidence: 0.75,
                    }]
                }
            ),
        ]
    });
    &PATTERNS
}

const TOPIC_STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "i", "me", "my", "and", "or", "to", "of", "in",
    "on", "at", "it", "that", "this", "with", "for",
];

fn fallback_topic(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.len() > 3 && !TOPIC_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .max_by_key(|w| w.len())
        .map(|w| w.to_string())
}

/// First matching pattern in priority order wins per sentence clause; all
/// matches across the whole text are returned (a single utterance can state
/// more than one fact). Falls back to a single topic-tagging fact when
/// nothing else matched.
pub fn extract_facts(text: &str) -> Vec<ExtractedFact> {
    let mut facts = Vec::new();
    for pattern in patterns() {
        if let Some(caps) = pattern.regex.captures(text) {
            facts.extend((pattern.build)(&caps));
        }
    }

    if facts.is_empty() {
        if let Some(topic) = fallback_topic(text) {
            facts.push(ExtractedFact {
                subject: "memory".into(),
                predicate: "about_topic".into(),
                object: topic,
                category: PredicateCategory::Belief,
                confidence: 0.7,
            });
        }
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_location_from_live_in() {
        let facts = extract_facts("I live in San Francisco.");
        assert!(facts
            .iter()
            .any(|f| f.predicate == "lives_in" && f.object == "San Francisco"));
    }

    #[test]
    fn moved_to_has_lower_confidence_than_live_in() {
        let moved = extract_facts("I moved to Austin.");
        let lives = extract_facts("I live in Austin.");
        assert!(moved[0].confidence < lives[0].confidence);
    }

    #[test]
    fn extracts_job_title_alongside_employer() {
        let facts = extract_facts("I work at Acme as a senior engineer");
        assert!(facts.iter().any(|f| f.predicate == "works_at" && f.object == "Acme"));
        assert!(facts.iter().any(|f| f.predicate == "job_title"));
    }

    #[test]
    fn extracts_preference_likes_and_dislikes() {
        let likes = extract_facts("I like running.");
        assert_eq!(likes[0].predicate, "likes");
        let dislikes = extract_facts("I hate mornings.");
        assert_eq!(dislikes[0].predicate, "dislikes");
    }

    #[test]
    fn extracts_relationship_name() {
        let facts = extract_facts("My mom's name is Sarah.");
        assert!(facts
            .iter()
            .any(|f| f.predicate == "name" && f.object == "Sarah" && f.subject == "my mom"));
    }

    #[test]
    fn rejects_objects_outside_length_bounds() {
        let facts = extract_facts("I live in X");
        assert!(facts.is_empty() || facts[0].object.chars().count() >= 2);
    }

    #[test]
    fn falls_back_to_topic_tagging_when_nothing_matches() {
        let facts = extract_facts("Thunderstorms rolled across the valley yesterday afternoon.");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].predicate, "about_topic");
        assert_eq!(facts[0].category, PredicateCategory::Belief);
    }
}
