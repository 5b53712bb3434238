//! Entity extraction: separate passes for people, places, organizations,
//! dates, and goals.

use crate::memory::EntityType;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: EntityType,
}

const STOP_CAPITALIZED: &[&str] = &[
    "I", "The", "My", "A", "An", "This", "That", "Today", "Yesterday", "Tomorrow", "Monday",
    "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

const KNOWN_CITIES: &[&str] = &[
    "new york", "san francisco", "los angeles", "chicago", "boston", "seattle", "austin",
    "denver", "london", "paris", "tokyo", "berlin", "toronto", "nyc", "sf",
];

const KNOWN_COMPANIES: &[&str] = &[
    "google", "microsoft", "amazon", "apple", "meta", "netflix", "openai", "anthropic",
];

static MY_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmy ([a-z]+)'?s? name is ([A-Z][a-zA-Z'-]*)").unwrap());

static IN_PLACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin ([A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)?)").unwrap());

static AT_ORG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\bat|\bfor|\bwith) ([A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)?)").unwrap());

static MONTH_DAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2})(?:st|nd|rd|th)?",
    )
    .unwrap()
});

static GOAL_PHRASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:want to|goal is to|trying to|working on) ([a-zA-Z][a-zA-Z0-9 ,.'-]*)").unwrap()
});

fn capitalized_tokens(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| {
            !w.is_empty()
                && w.chars().next().unwrap().is_uppercase()
                && !STOP_CAPITALIZED.contains(w)
        })
        .collect()
}

pub fn extract_entities(text: &str) -> Vec<ExtractedEntity> {
    let mut entities = Vec::new();

    // People: "my X's name is Y" patterns take priority over bare token scan.
    for caps in MY_NAME_PATTERN.captures_iter(text) {
        entities.push(ExtractedEntity {
            name: caps[2].to_string(),
            entity_type: EntityType::Person,
        });
    }

    // Remaining capitalized tokens not already captured as a named person,
    // filtered against the closed stop-list.
    for token in capitalized_tokens(text) {
        if entities.iter().any(|e| e.name == token) {
            continue;
        }
        let lower = token.to_lowercase();
        if KNOWN_CITIES.iter().any(|c| c == &lower) {
            continue;
        }
        if KNOWN_COMPANIES.iter().any(|c| c == &lower) {
            continue;
        }
        entities.push(ExtractedEntity {
            name: token.to_string(),
            entity_type: EntityType::Person,
        });
    }

    // Places: closed city list plus "in <Capitalized>".
    let lower_text = text.to_lowercase();
    for city in KNOWN_CITIES {
        if lower_text.contains(city) {
            entities.push(ExtractedEntity {
                name: city.to_string(),
                entity_type: EntityType::Place,
            });
        }
    }
    for caps in IN_PLACE_PATTERN.captures_iter(text) {
        entities.push(ExtractedEntity {
            name: caps[1].to_string(),
            entity_type: EntityType::Place,
        });
    }

    // Organizations: closed company list plus "(at|for|with) <Capitalized>".
    for company in KNOWN_COMPANIES {
        if lower_text.contains(company) {
            entities.push(ExtractedEntity {
                name: company.to_string(),
                entity_type: EntityType::Organization,
            });
        }
    }
    for caps in AT_ORG_PATTERN.captures_iter(text) {
        entities.push(ExtractedEntity {
            name: caps[1].to_string(),
            entity_type: EntityType::Organization,
        });
    }

    // Dates: month-day patterns.
    for caps in MONTH_DAY_PATTERN.captures_iter(text) {
        entities.push(ExtractedEntity {
            name: format!("{} {}", &caps[1], &caps[2]),
            entity_type: EntityType::Date,
        });
    }

    // Goals: phrases after "want to / goal is / trying to / working on".
    for caps in GOAL_PHRASE_PATTERN.captures_iter(text) {
        let phrase = caps[1].trim_end_matches(['.', '!', '?']).trim();
        if !phrase.is_empty() {
            entities.push(ExtractedEntity {
                name: phrase.to_string(),
                entity_type: EntityType::Goal,
            });
        }
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_person_from_my_name_is_pattern() {
        let entities = extract_entities("My mom's name is Sarah.");
        assert!(entities
            .iter()
            .any(|e| e.name == "Sarah" && e.entity_type == EntityType::Person));
    }

    #[test]
    fn extracts_known_city_case_insensitively() {
        let entities = extract_entities("I live in san francisco now.");
        assert!(entities
            .iter()
            .any(|e| e.entity_type == EntityType::Place && e.name == "san francisco"));
    }

    #[test]
    fn extracts_goal_phrase() {
        let entities = extract_entities("My goal is to run a marathon.");
        assert!(entities
            .iter()
            .any(|e| e.entity_type == EntityType::Goal && e.name.contains("run a marathon")));
    }

    #[test]
    fn extracts_month_day_dates() {
        let entities = extract_entities("My birthday is March 3rd.");
        assert!(entities
            .iter()
            .any(|e| e.entity_type == EntityType::Date && e.name == "March 3"));
    }

    #[test]
    fn stoplist_excludes_sentence_initial_pronouns() {
        let entities = extract_entities("I went to the store.");
        assert!(!entities.iter().any(|e| e.name == "I"));
    }
}
