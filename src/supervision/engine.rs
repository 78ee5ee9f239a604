// SupervisionEngine (C4): builds and scores bounded thought trees.
//
// Grounded on `finch`'s BrainSession::spawn cancellation-token idiom
// (examples/darwin-finch-finch/src/brain/mod.rs) for the cancellable,
// depth-first expansion below.

use super::expander::Expander;
use super::guardian::Guardian;
use super::node::{Action, NodeState, ThoughtNode};
use super::selector::{PathScore, Selector};
use super::tree::ThoughtTree;
use crate::config::SupervisionConfig;
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedStep {
    pub action: Action,
    pub approved: bool,
    pub score: f64,
    pub reason: String,
}

pub struct SupervisionEngine {
    config: SupervisionConfig,
    guardian: Arc<dyn Guardian>,
    selector: Arc<dyn Selector>,
    enabled: AtomicBool,
    active: DashMap<String, ThoughtTree>,
    completed: DashMap<String, ThoughtTree>,
}

impl SupervisionEngine {
    pub fn new(config: SupervisionConfig, guardian: Arc<dyn Guardian>, selector: Arc<dyn Selector>) -> Self {
        let enabled = AtomicBool::new(config.enabled);
        Self {
            config,
            guardian,
            selector,
            enabled,
            active: DashMap::new(),
            completed: DashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// One-off guardian evaluation of free-standing text, without a tree.
    pub async fn evaluate_thought(&self, text: &str) -> super::guardian::GuardianResult {
        let node = ThoughtNode::root(Action::Think(text.to_string()));
        self.guardian.evaluate(&node, None, &[], self.config.guardian_timeout).await
    }

    pub async fn build_tree(
        &self,
        request_id: impl Into<String>,
        query: &str,
        initial_thought: Action,
        expander: Arc<dyn Expander>,
        cancel: CancellationToken,
    ) -> anyhow::Result<ThoughtTree> {
        let start = Instant::now();
        let request_id = request_id.into();
        let root = ThoughtNode::root(initial_thought);
        let root_id = root.id;
        let mut tree = ThoughtTree::new(request_id.clone(), root);
        tree.metadata.insert("query".to_string(), query.to_string());

        self.expand_node(&mut tree, root_id, query, Vec::new(), expander.as_ref(), &cancel)
            .await;

        let best = self.selector.select_best(&tree).await;
        tree.best_path = best.map(|p| p.path);
        tree.build_duration = start.elapsed();

        self.completed.insert(request_id, tree.clone());
        Ok(tree)
    }

    fn expand_node<'a>(
        &'a self,
        tree: &'a mut ThoughtTree,
        node_id: Uuid,
        query: &'a str,
        context: Vec<String>,
        expander: &'a dyn Expander,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                debug!("supervision: cancelled, aborting expansion");
                return;
            }
            if tree.node_count() >= self.config.max_nodes {
                return;
            }

            let Some(node) = tree.get(node_id).cloned() else {
                return;
            };
            if node.depth >= self.config.max_depth || node.state.is_terminal() {
                return;
            }

            let parent = node.parent.and_then(|id| tree.get(id).cloned());
            let siblings: Vec<ThoughtNode> = parent
                .as_ref()
                .map(|p| p.children.iter().filter_map(|id| tree.get(*id).cloned()).collect())
                .unwrap_or_default();

            let result = self
                .guardian
                .evaluate(&node, parent.as_ref(), &siblings, self.config.guardian_timeout)
                .await;

            {
                let entry = tree.nodes.get_mut(&node_id).expect("node exists");
                entry.score = result.score;
                entry.approved = result.approved;
                if result.approved {
                    entry.state = NodeState::Complete;
                } else {
                    entry.mark_pruned();
                    tree.pruned_count += 1;
                }
            }

            if !result.approved {
                return;
            }

            let remaining_budget = self.config.max_nodes.saturating_sub(tree.node_count());
            if remaining_budget == 0 {
                return;
            }
            let branches = self.config.max_branches.min(remaining_budget);
            if branches == 0 {
                return;
            }

            let mut child_context = context.clone();
            child_context.push(node.action.text().to_string());

            let actions = match expander.expand(&node, query, &context, branches).await {
                Ok(actions) => actions,
                Err(e) => {
                    warn!(error = %e, node = %node_id, "supervision: expander failed");
                    if let Some(entry) = tree.nodes.get_mut(&node_id) {
                        entry.mark_failed(e.to_string());
                    }
                    return;
                }
            };

            let current_node = tree.get(node_id).cloned().expect("node exists");
            for action in actions {
                if cancel.is_cancelled() || tree.node_count() >= self.config.max_nodes {
                    break;
                }
                let child = ThoughtNode::child(&current_node, action);
                let child_id = tree.insert(child);
                self.expand_node(tree, child_id, query, child_context.clone(), expander, cancel)
                    .await;
            }
        })
    }

    pub async fn select_best_path(&self, tree: &ThoughtTree) -> Option<PathScore> {
        self.selector.select_best(tree).await
    }

    pub async fn rank_paths(&self, tree: &ThoughtTree) -> Vec<PathScore> {
        self.selector.rank_paths(tree).await
    }

    /// Mark every node scoring below `threshold` pruned; terminal nodes
    /// are left untouched.
    pub fn prune_tree(&self, tree: &mut ThoughtTree, threshold: f64) {
        for node in tree.nodes.values_mut() {
            if !node.state.is_terminal() && node.score < threshold {
                node.mark_pruned();
                tree.pruned_count += 1;
            }
        }
    }

    pub fn get_active_tree(&self, request_id: &str) -> Option<ThoughtTree> {
        self.active.get(request_id).map(|e| e.value().clone())
    }

    pub fn complete_tree(&self, request_id: &str) -> Option<ThoughtTree> {
        self.active.remove(request_id);
        self.completed.get(request_id).map(|e| e.value().clone())
    }

    pub async fn supervise_step(&self, action: Action) -> SupervisedStep {
        let node = ThoughtNode::root(action.clone());
        let result = self.guardian.evaluate(&node, None, &[], self.config.guardian_timeout).await;
        SupervisedStep {
            action,
            approved: result.approved,
            score: result.score,
            reason: result.reason,
        }
    }

    pub async fn batch_supervise(&self, actions: Vec<Action>) -> Vec<SupervisedStep> {
        let futures = actions.into_iter().map(|a| self.supervise_step(a));
        futures::future::join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervision::expander::StubExpander;
    use crate::supervision::guardian::DefaultGuardian;
    use crate::supervision::selector::DefaultSelector;

    fn engine(config: SupervisionConfig) -> SupervisionEngine {
        SupervisionEngine::new(config, Arc::new(DefaultGuardian), Arc::new(DefaultSelector))
    }

    /// S4: MaxDepth=2, MaxBranches=2, an expander that always returns two
    /// children. node_count <= 1 + 2 + 4 = 7, max_depth <= 2.
    #[tokio::test]
    async fn depth_and_node_caps_are_respected() {
        let config = SupervisionConfig {
            max_branches: 2,
            max_depth: 2,
            max_nodes: 20,
            prune_threshold: 0.3,
            guardian_timeout: std::time::Duration::from_millis(200),
            node_timeout: std::time::Duration::from_secs(5),
            enabled: true,
        };
        let engine = engine(config);
        let tree = engine
            .build_tree(
                "req-1",
                "what should we do next",
                Action::Think("initial thought, reasonably long and well formed".to_string()),
                Arc::new(StubExpander),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(tree.max_depth() <= 2);
        assert!(tree.node_count() <= 7);
        if let Some(path) = &tree.best_path {
            let last = tree.get(*path.last().unwrap()).unwrap();
            assert!(last.depth <= 2);
        }
    }

    #[tokio::test]
    async fn build_tree_records_query_and_duration() {
        let config = SupervisionConfig {
            max_branches: 1,
            max_depth: 1,
            max_nodes: 10,
            prune_threshold: 0.3,
            guardian_timeout: std::time::Duration::from_millis(200),
            node_timeout: std::time::Duration::from_secs(5),
            enabled: true,
        };
        let engine = engine(config);
        let tree = engine
            .build_tree(
                "req-meta",
                "what is the weather",
                Action::Think("initial thought, reasonably long and well formed".to_string()),
                Arc::new(StubExpander),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(tree.metadata.get("query").map(String::as_str), Some("what is the weather"));
        assert!(tree.build_duration >= std::time::Duration::ZERO);
    }

    #[tokio::test]
    async fn cancellation_halts_expansion_immediately() {
        let config = SupervisionConfig {
            max_branches: 2,
            max_depth: 4,
            max_nodes: 50,
            prune_threshold: 0.3,
            guardian_timeout: std::time::Duration::from_millis(200),
            node_timeout: std::time::Duration::from_secs(5),
            enabled: true,
        };
        let engine = engine(config);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let tree = engine
            .build_tree(
                "req-2",
                "query",
                Action::Think("initial thought of reasonable length here".to_string()),
                Arc::new(StubExpander),
                cancel,
            )
            .await
            .unwrap();
        assert_eq!(tree.node_count(), 1);
    }

    #[tokio::test]
    async fn batch_supervise_evaluates_every_step_independently() {
        let engine = engine(SupervisionConfig::default());
        let steps = vec![
            Action::Think("a well formed and sufficiently long thought".to_string()),
            Action::ToolCall { tool: "".to_string(), params: "{}".to_string() },
        ];
        let results = engine.batch_supervise(steps).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].approved);
        assert!(!results[1].approved || results[1].score < 0.3);
    }

    #[test]
    fn prune_tree_marks_low_scoring_nodes() {
        let engine = engine(SupervisionConfig::default());
        let mut root = ThoughtNode::root(Action::Think("x".into()));
        root.score = 0.1;
        let mut tree = ThoughtTree::new("req-3", root);
        engine.prune_tree(&mut tree, 0.3);
        assert_eq!(tree.pruned_count, 1);
    }
}
