//! Retrieval Engine: classifies a query into one of six types, runs the
//! relevant strategies concurrently over an immutable snapshot, and merges
//! candidates into a single weighted ranking.

use crate::goals::GoalRegistry;
use crate::memory::{Fact, MemoryNode};
use crate::search::{keyword_overlap_score, VectorIndex};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Emotional,
    GoalProgress,
    Temporal,
    Factual,
    Conceptual,
    Exploratory,
}

impl QueryType {
    fn weights(self) -> Weights {
        match self {
            QueryType::Factual => Weights { vector: 0.20, keyword: 0.40, recency: 0.10, importance: 0.10, utility: 0.05, fact_match: 0.15 },
            QueryType::Conceptual => Weights { vector: 0.50, keyword: 0.10, recency: 0.10, importance: 0.15, utility: 0.10, fact_match: 0.05 },
            QueryType::Temporal => Weights { vector: 0.15, keyword: 0.15, recency: 0.45, importance: 0.10, utility: 0.05, fact_match: 0.10 },
            QueryType::GoalProgress => Weights { vector: 0.25, keyword: 0.15, recency: 0.20, importance: 0.20, utility: 0.10, fact_match: 0.10 },
            QueryType::Exploratory => Weights { vector: 0.35, keyword: 0.15, recency: 0.20, importance: 0.15, utility: 0.10, fact_match: 0.05 },
            QueryType::Emotional => Weights { vector: 0.30, keyword: 0.20, recency: 0.15, importance: 0.15, utility: 0.10, fact_match: 0.10 },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Weights {
    vector: f64,
    keyword: f64,
    recency: f64,
    importance: f64,
    utility: f64,
    fact_match: f64,
}

const EMOTIONAL_KEYWORDS: &[&str] = &["feel", "feeling", "felt", "emotion", "mood", "happy", "sad", "anxious", "upset"];
const GOAL_KEYWORDS: &[&str] = &["progress", "goal", "blocker", "stuck on", "working toward", "how am i doing"];
const TEMPORAL_KEYWORDS: &[&str] = &["when", "yesterday", "last week", "last month", "recently", "ago", "what happened"];
const FACTUAL_KEYWORDS: &[&str] = &["what is", "what's", "who is", "who's", "where", "name of"];
const CONCEPTUAL_KEYWORDS: &[&str] = &["why", "how does", "explain", "understand", "meaning of"];

/// First hit wins, tested in order: emotional, goal_progress, temporal,
/// factual, conceptual, else exploratory.
pub fn classify_query(text: &str) -> QueryType {
    let lower = text.to_lowercase();
    if EMOTIONAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QueryType::Emotional
    } else if GOAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QueryType::GoalProgress
    } else if TEMPORAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QueryType::Temporal
    } else if FACTUAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QueryType::Factual
    } else if CONCEPTUAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        QueryType::Conceptual
    } else {
        QueryType::Exploratory
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub vector: f64,
    pub keyword: f64,
    pub recency: f64,
    pub importance: f64,
    pub utility: f64,
    pub fact_match: f64,
    pub layer_boost: f64,
}

#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub memory: MemoryNode,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
    pub reason: String,
    pub layer: crate::memory::Layer,
}

#[derive(Debug, Clone)]
pub struct RetrievalResponse {
    pub results: Vec<ScoredResult>,
    pub query_type: QueryType,
    pub strategies_used: Vec<&'static str>,
    pub elapsed_ms: u64,
}

fn recency(node: &MemoryNode, now: chrono::DateTime<Utc>) -> f64 {
    let age_days = (now - node.created_at).num_seconds().max(0) as f64 / 86_400.0;
    (-node.layer.decay_rate() * age_days).exp()
}

fn layer_boost(node: &MemoryNode) -> f64 {
    node.layer.retrieval_priority() / 100.0
}

fn merge_score(weights: Weights, breakdown: &ScoreBreakdown) -> f64 {
    let weighted = weights.vector * breakdown.vector
        + weights.keyword * breakdown.keyword
        + weights.recency * breakdown.recency
        + weights.importance * breakdown.importance
        + weights.utility * breakdown.utility
        + weights.fact_match * breakdown.fact_match;
    (weighted * (1.0 + 0.1 * breakdown.layer_boost)).min(1.0)
}

fn vector_strategy(query_vector: &[f32], index: &dyn VectorIndex, k: usize) -> Vec<(String, f64)> {
    let excluded = std::collections::HashSet::new();
    index
        .search(query_vector, k * 2, 0.2, &excluded)
        .unwrap_or_default()
        .into_iter()
        .map(|(id, score)| (id, score as f64))
        .collect()
}

fn keyword_strategy(query_text: &str, nodes: &[MemoryNode]) -> Vec<(String, f64)> {
    nodes
        .iter()
        .map(|n| (n.id.clone(), keyword_overlap_score(query_text, &n.content) as f64))
        .filter(|(_, score)| *score > 0.0)
        .collect()
}

fn extract_candidate_subjects(query_text: &str) -> Vec<String> {
    let mut subjects = Vec::new();
    for quoted in query_text.split('"').skip(1).step_by(2) {
        subjects.push(quoted.trim().to_lowercase());
    }
    for token in query_text.split_whitespace() {
        let trimmed = token.trim_matches(|c: char| !c.is_alphanumeric());
        if !trimmed.is_empty() && trimmed.chars().next().unwrap().is_uppercase() {
            subjects.push(trimmed.to_lowercase());
        }
    }
    // Mirrors extraction's `normalize_subject("my <word>")`: a "my mom's
    // name" style query needs the literal "my mom" subject to match the
    // fact's stored subject, not just the generic "user" self-reference.
    let lower = query_text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    for pair in words.windows(2) {
        if pair[0] == "my" {
            let possessed = pair[1].trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
            let possessed = possessed.split('\'').next().unwrap_or(possessed);
            if !possessed.is_empty() {
                subjects.push(format!("my {possessed}"));
            }
        }
    }
    if lower.contains("my mom") || lower.contains("my mother") {
        subjects.push("user".to_string());
    }
    subjects
}

fn fact_lookup_strategy(query_text: &str, facts: &[Fact]) -> Vec<(String, f64)> {
    let subjects = extract_candidate_subjects(query_text);
    facts
        .iter()
        .filter(|f| subjects.iter().any(|s| s == &f.subject) && f.is_latest)
        .map(|f| (f.source_memory_id.clone(), f.confidence as f64))
        .collect()
}

fn goal_based_strategy(query_text: &str, registry: &GoalRegistry, user_id: &str) -> Vec<(String, f64)> {
    let mut candidates = Vec::new();
    for cluster in registry.all_for_user(user_id) {
        let score = jaccard_relevance(query_text, &cluster.goal_content);
        if score <= 0.2 {
            continue;
        }
        for id in cluster
            .progress_ids
            .iter()
            .chain(&cluster.blocker_ids)
            .chain(&cluster.motivation_ids)
            .chain(&cluster.insight_ids)
        {
            candidates.push((id.clone(), 0.8));
        }
    }
    candidates
}

fn jaccard_relevance(a: &str, b: &str) -> f64 {
    use std::collections::HashSet;
    let tokenize = |s: &str| -> HashSet<String> {
        s.split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    };
    let ta = tokenize(a);
    let tb = tokenize(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    intersection / union
}

/// An immutable view of the data the engine's strategies read from; built
/// by the facade before strategies run so that each strategy sees a
/// consistent snapshot regardless of concurrent writes.
pub struct RetrievalSnapshot {
    pub nodes: Vec<MemoryNode>,
    pub facts: Vec<Fact>,
    pub query_embedding: Option<Vec<f32>>,
}

#[allow(clippy::too_many_arguments)]
pub async fn retrieve(
    query_text: &str,
    user_id: &str,
    top_k: usize,
    snapshot: RetrievalSnapshot,
    vector_index: &dyn VectorIndex,
    goal_registry: &GoalRegistry,
    cancel: CancellationToken,
) -> RetrievalResponse {
    let start = Instant::now();
    let query_type = classify_query(query_text);
    let weights = query_type.weights();

    let nodes_by_id: HashMap<String, MemoryNode> =
        snapshot.nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();

    let vector_fut = async {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        match &snapshot.query_embedding {
            Some(v) => vector_strategy(v, vector_index, top_k),
            None => Vec::new(),
        }
    };
    let keyword_fut = async { keyword_strategy(query_text, &snapshot.nodes) };
    let fact_fut = async {
        if matches!(query_type, QueryType::Factual) {
            fact_lookup_strategy(query_text, &snapshot.facts)
        } else {
            Vec::new()
        }
    };
    let goal_fut = async {
        if matches!(query_type, QueryType::GoalProgress) {
            goal_based_strategy(query_text, goal_registry, user_id)
        } else {
            Vec::new()
        }
    };

    let (vector_candidates, keyword_candidates, fact_candidates, goal_candidates) =
        tokio::join!(vector_fut, keyword_fut, fact_fut, goal_fut);

    let mut strategies_used = vec!["vector", "keyword"];
    if !fact_candidates.is_empty() {
        strategies_used.push("fact_lookup");
    }
    if !goal_candidates.is_empty() {
        strategies_used.push("goal_based");
    }

    let mut breakdowns: HashMap<String, ScoreBreakdown> = HashMap::new();
    let now = Utc::now();

    for (id, score) in vector_candidates {
        breakdowns.entry(id).or_default().vector = score;
    }
    for (id, score) in keyword_candidates {
        breakdowns.entry(id).or_default().keyword = score;
    }
    for (id, score) in fact_candidates {
        let entry = breakdowns.entry(id).or_default();
        entry.fact_match = entry.fact_match.max(score);
    }
    for (id, score) in goal_candidates {
        // Goal-based candidates carry no dedicated breakdown slot; they
        // contribute through keyword relevance, same as the spec's generic
        // "candidate with partial_score" shape for non-vector strategies.
        let entry = breakdowns.entry(id).or_default();
        entry.keyword = entry.keyword.max(score);
    }

    let mut results: Vec<ScoredResult> = breakdowns
        .into_iter()
        .filter_map(|(id, mut breakdown)| {
            let node = nodes_by_id.get(&id)?.clone();
            if !node.is_latest {
                return None;
            }
            breakdown.recency = recency(&node, now);
            breakdown.importance = node.importance as f64;
            breakdown.utility = node.utility();
            breakdown.layer_boost = layer_boost(&node);

            let final_score = merge_score(weights, &breakdown);
            let reason = dominant_reason(&breakdown);
            Some(ScoredResult {
                layer: node.layer,
                memory: node,
                final_score,
                breakdown,
                reason,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap()
            .then_with(|| b.breakdown.recency.partial_cmp(&a.breakdown.recency).unwrap())
            .then_with(|| a.memory.id.cmp(&b.memory.id))
    });
    results.truncate(top_k);

    RetrievalResponse {
        results,
        query_type,
        strategies_used,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

fn dominant_reason(breakdown: &ScoreBreakdown) -> String {
    let components: [(&str, f64); 6] = [
        ("semantic similarity", breakdown.vector),
        ("keyword overlap", breakdown.keyword),
        ("recency", breakdown.recency),
        ("importance", breakdown.importance),
        ("retrieval utility", breakdown.utility),
        ("fact match", breakdown.fact_match),
    ];
    components
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(label, _)| label.to_string())
        .unwrap_or_else(|| "default".to_string())
}

/// Optional post-hook: boosts a candidate's score by its token overlap
/// ratio with the query, up to 2x.
pub fn exact_match_booster(query_text: &str, content: &str, base_score: f64) -> f64 {
    let ratio = jaccard_relevance(query_text, content).min(1.0);
    (base_score * (1.0 + ratio)).min(1.0)
}
