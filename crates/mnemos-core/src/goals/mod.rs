//! Goal Clustering: classifies incoming memories as progress, blocker,
//! motivation, or insight relative to a registered goal, and tracks each
//! goal's emotional trajectory over time.
//!
//! Clusters are kept in an in-memory map guarded by a lock; the backing
//! table in Storage is the source of truth and this map is rehydrated from
//! it on startup, never the other way around.

use crate::memory::{GoalCluster, Trend, ValenceSample};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

const GOAL_KEYWORDS: &[&str] = &[
    "goal", "want to", "plan to", "trying to", "working on", "aim to", "hope to", "need to",
    "going to", "will", "resolution", "objective", "target", "dream", "aspire",
];

const PROGRESS_KEYWORDS: &[&str] = &[
    "finished", "completed", "did", "ran", "achieved", "made progress", "hit", "reached",
    "accomplished",
];

const BLOCKER_KEYWORDS: &[&str] = &[
    "stuck", "can't", "cannot", "blocked", "struggling", "failed", "couldn't", "difficult",
];

const MOTIVATION_KEYWORDS: &[&str] =
    &["motivated", "inspired", "excited about", "pumped", "determined", "why i"];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "to", "is", "am", "are", "i", "my", "me", "of", "in", "on", "for", "and",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClassification {
    Progress,
    Blocker,
    Motivation,
    RelatedTo,
}

#[derive(Debug, Clone)]
pub struct LinkResult {
    pub goal_id: String,
    pub classification: LinkClassification,
    pub relevance: f32,
}

#[derive(Debug, Clone)]
pub struct CoachingContext {
    pub goal_content: String,
    pub progress_count: usize,
    pub blocker_count: usize,
    pub motivation_count: usize,
    pub trend: Trend,
}

pub fn is_goal_content(content: &str) -> bool {
    let lower = content.to_lowercase();
    GOAL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f32;
    let union = a.union(b).count() as f32;
    intersection / union
}

fn relevance(memory_content: &str, goal_content: &str) -> f32 {
    let memory_tokens = tokenize(memory_content);
    let goal_tokens = tokenize(goal_content);
    let mut score = jaccard(&memory_tokens, &goal_tokens);

    let lower = memory_content.to_lowercase();
    if PROGRESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        score += 0.15;
    }
    if BLOCKER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        score += 0.15;
    }
    if MOTIVATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        score += 0.10;
    }
    score
}

fn classify(content: &str) -> LinkClassification {
    let lower = content.to_lowercase();
    if PROGRESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LinkClassification::Progress
    } else if BLOCKER_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LinkClassification::Blocker
    } else if MOTIVATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LinkClassification::Motivation
    } else {
        LinkClassification::RelatedTo
    }
}

/// In-memory registry of goal clusters for one engine instance. The
/// backing `goal_clusters` table in Storage is authoritative; `rehydrate`
/// repopulates this map from it at startup.
pub struct GoalRegistry {
    clusters: RwLock<HashMap<String, GoalCluster>>,
}

impl Default for GoalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GoalRegistry {
    pub fn new() -> Self {
        Self {
            clusters: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the in-memory map with rows freshly read from storage. Call
    /// once at startup before accepting writes.
    pub fn rehydrate(&self, clusters: Vec<GoalCluster>) {
        let mut map = self.clusters.write().unwrap();
        map.clear();
        for cluster in clusters {
            map.insert(cluster.id.clone(), cluster);
        }
    }

    /// Rehydrates a single user's clusters from storage without disturbing
    /// other users already loaded in this process.
    pub fn load_user(&self, user_id: &str, clusters: Vec<GoalCluster>) {
        let mut map = self.clusters.write().unwrap();
        map.retain(|_, c| c.user_id != user_id);
        for cluster in clusters {
            map.insert(cluster.id.clone(), cluster);
        }
    }

    pub fn register_goal(&self, memory_id: String, content: String, user_id: String) -> GoalCluster {
        let id = uuid::Uuid::new_v4().to_string();
        let cluster = GoalCluster::new(id.clone(), memory_id, content, user_id);
        self.clusters.write().unwrap().insert(id, cluster.clone());
        cluster
    }

    /// Evaluates `memory_content` against every registered goal for
    /// `user_id`, linking and classifying wherever relevance exceeds 0.3.
    pub fn link(
        &self,
        memory_id: &str,
        memory_content: &str,
        valence: f32,
        user_id: &str,
    ) -> Vec<LinkResult> {
        let mut map = self.clusters.write().unwrap();
        let mut results = Vec::new();

        for cluster in map.values_mut().filter(|c| c.user_id == user_id) {
            let score = relevance(memory_content, &cluster.goal_content);
            if score <= 0.3 {
                continue;
            }
            let classification = classify(memory_content);
            match classification {
                LinkClassification::Progress => cluster.progress_ids.push(memory_id.to_string()),
                LinkClassification::Blocker => cluster.blocker_ids.push(memory_id.to_string()),
                LinkClassification::Motivation => cluster.motivation_ids.push(memory_id.to_string()),
                LinkClassification::RelatedTo => cluster.insight_ids.push(memory_id.to_string()),
            }
            cluster.emotional_trajectory.push(ValenceSample {
                at: Utc::now(),
                valence,
            });
            results.push(LinkResult {
                goal_id: cluster.id.clone(),
                classification,
                relevance: score,
            });
        }

        results
    }

    pub fn coaching_context(&self, goal_id: &str) -> Option<CoachingContext> {
        let map = self.clusters.read().unwrap();
        map.get(goal_id).map(|cluster| CoachingContext {
            goal_content: cluster.goal_content.clone(),
            progress_count: cluster.progress_ids.len(),
            blocker_count: cluster.blocker_ids.len(),
            motivation_count: cluster.motivation_ids.len(),
            trend: cluster.trend(),
        })
    }

    pub fn get(&self, goal_id: &str) -> Option<GoalCluster> {
        self.clusters.read().unwrap().get(goal_id).cloned()
    }

    pub fn all_for_user(&self, user_id: &str) -> Vec<GoalCluster> {
        self.clusters
            .read()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_goal_content_matches_closed_keyword_set() {
        assert!(is_goal_content("My goal is to run a marathon."));
        assert!(is_goal_content("I plan to learn Rust this year."));
        assert!(!is_goal_content("The meeting is at 3pm."));
    }

    #[test]
    fn register_and_link_progress_memory() {
        let registry = GoalRegistry::new();
        let cluster = registry.register_goal(
            "m1".into(),
            "My goal is to run a marathon".into(),
            "u1".into(),
        );

        let results = registry.link("m2", "I finished a 10 mile marathon training run today", 0.6, "u1");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].goal_id, cluster.id);
        assert_eq!(results[0].classification, LinkClassification::Progress);
    }

    #[test]
    fn unrelated_memory_does_not_link() {
        let registry = GoalRegistry::new();
        registry.register_goal("m1".into(), "My goal is to run a marathon".into(), "u1".into());

        let results = registry.link("m2", "I had pasta for dinner.", 0.0, "u1");
        assert!(results.is_empty());
    }

    #[test]
    fn rehydrate_replaces_in_memory_state() {
        let registry = GoalRegistry::new();
        registry.register_goal("m1".into(), "learn guitar".into(), "u1".into());
        assert_eq!(registry.all_for_user("u1").len(), 1);

        let fresh = GoalCluster::new("c2".into(), "m2".into(), "learn piano".into(), "u1".into());
        registry.rehydrate(vec![fresh]);
        let clusters = registry.all_for_user("u1");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].goal_content, "learn piano");
    }

    #[test]
    fn coaching_context_reports_counts_and_trend() {
        let registry = GoalRegistry::new();
        let cluster = registry.register_goal("m1".into(), "goal: learn spanish".into(), "u1".into());
        registry.link("m2", "I finished my spanish lesson today", 0.5, "u1");

        let ctx = registry.coaching_context(&cluster.id).unwrap();
        assert_eq!(ctx.progress_count, 1);
    }
}
