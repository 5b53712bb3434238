//! Emotional valence extraction: scans a fixed emotion keyword table and
//! derives a primary/secondary emotion split plus a scalar sentiment.

use crate::memory::EmotionalValence;

struct EmotionRow {
    keywords: &'static [&'static str],
    emotion: &'static str,
    intensity: f32,
    positive: bool,
}

const EMOTION_TABLE: &[EmotionRow] = &[
    EmotionRow { keywords: &["thrilled", "ecstatic", "ecstasy", "ecstatic"], emotion: "joy", intensity: 0.95, positive: true },
    EmotionRow { keywords: &["happy", "glad", "delighted", "love", "loved", "excited"], emotion: "joy", intensity: 0.8, positive: true },
    EmotionRow { keywords: &["content", "satisfied", "pleased", "good"], emotion: "joy", intensity: 0.5, positive: true },
    EmotionRow { keywords: &["proud", "accomplished", "grateful", "thankful"], emotion: "pride", intensity: 0.7, positive: true },
    EmotionRow { keywords: &["furious", "enraged", "livid"], emotion: "anger", intensity: 0.9, positive: false },
    EmotionRow { keywords: &["angry", "frustrated", "annoyed", "irritated", "mad"], emotion: "frustration", intensity: 0.7, positive: false },
    EmotionRow { keywords: &["terrified", "panicked", "dread"], emotion: "fear", intensity: 0.9, positive: false },
    EmotionRow { keywords: &["anxious", "nervous", "worried", "scared", "afraid"], emotion: "anxiety", intensity: 0.65, positive: false },
    EmotionRow { keywords: &["devastated", "heartbroken", "miserable"], emotion: "sadness", intensity: 0.9, positive: false },
    EmotionRow { keywords: &["sad", "down", "upset", "disappointed", "hurt"], emotion: "sadness", intensity: 0.6, positive: false },
    EmotionRow { keywords: &["confused", "unsure", "uncertain", "lost"], emotion: "confusion", intensity: 0.5, positive: false },
    EmotionRow { keywords: &["surprised", "shocked", "amazed", "astonished"], emotion: "surprise", intensity: 0.6, positive: true },
    EmotionRow { keywords: &["struggling", "couldn't", "failed", "hate", "dislike"], emotion: "frustration", intensity: 0.55, positive: false },
];

const NEGATIONS: &[&str] = &["not", "never", "no", "n't", "isn't", "wasn't", "don't", "didn't"];

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_negated(tokens: &[String], index: usize) -> bool {
    let start = index.saturating_sub(2);
    tokens[start..index].iter().any(|t| NEGATIONS.contains(&t.as_str()))
}

struct Match {
    emotion: &'static str,
    intensity: f32,
    positive: bool,
}

pub fn extract_valence(text: &str) -> EmotionalValence {
    let tokens = tokenize(text);
    let mut matches: Vec<Match> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        for row in EMOTION_TABLE {
            if row.keywords.contains(&token.as_str()) {
                let negated = is_negated(&tokens, idx);
                matches.push(Match {
                    emotion: row.emotion,
                    intensity: row.intensity,
                    positive: row.positive ^ negated,
                });
            }
        }
    }

    if matches.is_empty() {
        return EmotionalValence::default();
    }

    matches.sort_by(|a, b| b.intensity.partial_cmp(&a.intensity).unwrap());

    let positive_count = matches.iter().filter(|m| m.positive).count() as f32;
    let negative_count = matches.iter().filter(|m| !m.positive).count() as f32;
    let sentiment = (positive_count - negative_count) / matches.len() as f32;

    let primary = matches[0].emotion.to_string();
    let secondary: Vec<String> = matches[1..]
        .iter()
        .map(|m| m.emotion.to_string())
        .filter(|e| e != &primary)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .take(3)
        .collect();

    EmotionalValence {
        primary_emotion: primary,
        intensity: matches[0].intensity,
        secondary_emotions: secondary,
        sentiment: sentiment.clamp(-1.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_has_default_valence() {
        let v = extract_valence("The meeting is at 3pm.");
        assert_eq!(v.primary_emotion, "neutral");
        assert_eq!(v.sentiment, 0.0);
        assert_eq!(v.intensity, 0.5);
    }

    #[test]
    fn positive_keyword_yields_positive_sentiment() {
        let v = extract_valence("I am so happy and excited today!");
        assert_eq!(v.primary_emotion, "joy");
        assert!(v.sentiment > 0.0);
    }

    #[test]
    fn negation_flips_keyword_polarity() {
        let v = extract_valence("I am not happy about this.");
        assert!(v.sentiment <= 0.0);
    }

    #[test]
    fn mixed_emotions_blend_to_sentiment_in_range() {
        let v = extract_valence("I ran 10 miles today but my knee hurt afterward.");
        assert!(v.sentiment >= -1.0 && v.sentiment <= 1.0);
    }
}
