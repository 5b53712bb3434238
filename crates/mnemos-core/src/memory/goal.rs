//! Goal clusters: a goal memory plus its partitioned related memories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped valence sample in a goal's emotional trajectory.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValenceSample {
    pub at: DateTime<Utc>,
    pub valence: f32,
}

/// Direction of a goal's emotional trend, comparing the mean sentiment of
/// the first and second half of its trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct GoalCluster {
    pub id: String,
    pub goal_memory_id: String,
    pub goal_content: String,
    pub created_at: DateTime<Utc>,
    pub progress_ids: Vec<String>,
    pub blocker_ids: Vec<String>,
    pub motivation_ids: Vec<String>,
    pub insight_ids: Vec<String>,
    pub emotional_trajectory: Vec<ValenceSample>,
    pub user_id: String,
}

impl GoalCluster {
    pub fn new(id: String, goal_memory_id: String, goal_content: String, user_id: String) -> Self {
        Self {
            id,
            goal_memory_id,
            goal_content,
            created_at: Utc::now(),
            progress_ids: Vec::new(),
            blocker_ids: Vec::new(),
            motivation_ids: Vec::new(),
            insight_ids: Vec::new(),
            emotional_trajectory: Vec::new(),
            user_id,
        }
    }

    /// Mean sentiment of first half vs second half of the trajectory;
    /// `|delta| > 0.2` is Improving/Declining, else Stable.
    pub fn trend(&self) -> Trend {
        if self.emotional_trajectory.len() < 2 {
            return Trend::Stable;
        }
        let mid = self.emotional_trajectory.len() / 2;
        let (first, second) = self.emotional_trajectory.split_at(mid);
        let mean = |xs: &[ValenceSample]| -> f32 {
            if xs.is_empty() {
                0.0
            } else {
                xs.iter().map(|s| s.valence).sum::<f32>() / xs.len() as f32
            }
        };
        let delta = mean(second) - mean(first);
        if delta > 0.2 {
            Trend::Improving
        } else if delta < -0.2 {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(v: f32) -> ValenceSample {
        ValenceSample {
            at: Utc::now(),
            valence: v,
        }
    }

    #[test]
    fn trend_detects_improvement() {
        let mut cluster = GoalCluster::new("c1".into(), "g1".into(), "run a marathon".into(), "u1".into());
        cluster.emotional_trajectory = vec![sample(-0.5), sample(-0.4), sample(0.3), sample(0.4)];
        assert_eq!(cluster.trend(), Trend::Improving);
    }

    #[test]
    fn trend_stable_with_few_samples() {
        let cluster = GoalCluster::new("c1".into(), "g1".into(), "run a marathon".into(), "u1".into());
        assert_eq!(cluster.trend(), Trend::Stable);
    }
}
