// Selector: ranks complete paths through a ThoughtTree (C4).

use super::node::{Action, ThoughtNode};
use super::tree::ThoughtTree;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct PathScore {
    pub path: Vec<Uuid>,
    pub total_score: f64,
    pub avg_score: f64,
    pub min_score: f64,
}

#[async_trait]
pub trait Selector: Send + Sync {
    async fn select_best(&self, tree: &ThoughtTree) -> Option<PathScore>;
    async fn rank_paths(&self, tree: &ThoughtTree) -> Vec<PathScore>;
}

pub struct DefaultSelector;

impl DefaultSelector {
    fn score_path(&self, tree: &ThoughtTree, path: &[Uuid]) -> PathScore {
        let nodes = tree.path_nodes(path);
        let scores: Vec<f64> = nodes.iter().map(|n| n.score.clamp(0.0, 1.0)).collect();
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        let min_score = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let min_score = if min_score.is_finite() { min_score } else { 0.0 };

        let depth = nodes.last().map(|n| n.depth).unwrap_or(0);
        let depth_preference = match depth {
            0 => 0.3,
            1 => 0.5,
            2 | 3 => 1.0,
            4..=7 => 0.7,
            _ => 0.2,
        };

        let has_conclusion = nodes.iter().any(|n| matches!(n.action, Action::Conclude(_)));

        let tool_count = nodes
            .iter()
            .filter(|n| matches!(n.action, Action::ToolCall { .. }))
            .count();
        let tool_shape = match tool_count {
            0 => 0.5,
            1 => 0.8,
            2 | 3 => 1.0,
            _ => 0.7,
        };

        let total_score = avg_score * 0.4
            + depth_preference * 0.1
            + if has_conclusion { 1.0 } else { 0.0 } * 0.3
            + tool_shape * 0.2;

        PathScore {
            path: path.to_vec(),
            total_score,
            avg_score,
            min_score,
        }
    }
}

#[async_trait]
impl Selector for DefaultSelector {
    async fn select_best(&self, tree: &ThoughtTree) -> Option<PathScore> {
        self.rank_paths(tree).into_iter().next()
    }

    /// Leaf-terminated paths sorted by total score descending.
    async fn rank_paths(&self, tree: &ThoughtTree) -> Vec<PathScore> {
        let mut scored: Vec<PathScore> = tree
            .leaf_paths()
            .into_iter()
            .map(|path| self.score_path(tree, &path))
            .collect();
        scored.sort_by(|a, b| b.total_score.partial_cmp(&a.total_score).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}
