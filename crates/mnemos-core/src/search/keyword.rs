//! Keyword scoring: stopword-filtered token intersection ratio.
//!
//! This is deliberately not full-text search — no inverted index, no BM25,
//! no virtual table. It is a pure, in-process computation over a query and
//! a candidate's content, matching the scope that the retrieval engine's
//! keyword component is allowed to cover.

use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in", "on",
    "at", "for", "with", "about", "and", "or", "but", "i", "me", "my", "do", "does", "did",
    "what", "where", "when", "how", "who", "that", "this",
];

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// `|Q ∩ C| / |Q|`, plus a +0.3 bonus if the full query appears as a
/// substring of the content; clipped to 1.
pub fn keyword_overlap_score(query: &str, content: &str) -> f32 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content_tokens = tokenize(content);

    let overlap = query_tokens.intersection(&content_tokens).count();
    let mut score = overlap as f32 / query_tokens.len() as f32;

    if !query.trim().is_empty() && content.to_lowercase().contains(&query.trim().to_lowercase()) {
        score += 0.3;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_overlap_scores_one() {
        assert!((keyword_overlap_score("running shoes", "I bought new running shoes") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn partial_overlap_scores_fraction() {
        let score = keyword_overlap_score("running swimming", "I enjoy running every day");
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn substring_bonus_applies() {
        let exact = keyword_overlap_score("my favorite color", "my favorite color is blue");
        let scrambled = keyword_overlap_score("color favorite my", "my favorite color is blue");
        assert!(exact > scrambled);
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(keyword_overlap_score("", "anything"), 0.0);
    }

    #[test]
    fn stopwords_are_filtered_from_the_query() {
        // "what do I like" reduces to {"like"} after stopword filtering.
        let score = keyword_overlap_score("what do I like", "I like running");
        assert!(score >= 0.99);
    }
}
