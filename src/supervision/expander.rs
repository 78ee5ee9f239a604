// Expander: proposes up to MaxBranches child nodes for a node under
// expansion, given the original query and the context accumulated so
// far along the path to that node.

use super::node::{Action, ThoughtNode};
use async_trait::async_trait;

#[async_trait]
pub trait Expander: Send + Sync {
    async fn expand(
        &self,
        node: &ThoughtNode,
        query: &str,
        context: &[String],
        max_branches: usize,
    ) -> anyhow::Result<Vec<Action>>;
}

/// Deterministic expander used by tests and the demo CLI: alternates
/// between a "think" and a "conclude" branch, bounded by `max_branches`.
pub struct StubExpander;

#[async_trait]
impl Expander for StubExpander {
    async fn expand(
        &self,
        node: &ThoughtNode,
        query: &str,
        _context: &[String],
        max_branches: usize,
    ) -> anyhow::Result<Vec<Action>> {
        let mut out = Vec::new();
        for i in 0..max_branches {
            if i == max_branches - 1 && node.depth >= 1 {
                out.push(Action::Conclude(format!("concluding on: {query}")));
            } else {
                out.push(Action::Think(format!("branch {i} exploring: {query}")));
            }
        }
        Ok(out)
    }
}
