// ThoughtNode and its state machine (C4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// pending -> expanding -> complete -> (optionally) pruned | failed | timeout.
/// Terminal states never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Pending,
    Expanding,
    Complete,
    Pruned,
    Failed,
    TimedOut,
}

impl NodeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Pruned | NodeState::Failed | NodeState::TimedOut)
    }
}

/// What a node represents the reasoner doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Think(String),
    ToolCall { tool: String, params: String },
    Conclude(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThoughtNode {
    pub id: Uuid,
    pub parent: Option<Uuid>,
    pub children: Vec<Uuid>,
    pub depth: u32,
    pub action: Action,
    pub state: NodeState,
    pub score: f64,
    pub approved: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Action {
    pub fn text(&self) -> &str {
        match self {
            Action::Think(t) => t,
            Action::Conclude(t) => t,
            Action::ToolCall { tool, .. } => tool,
        }
    }
}

impl ThoughtNode {
    /// The tree's root: the initial thought, complete with score 1.0.
    pub fn root(action: Action) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: None,
            children: Vec::new(),
            depth: 0,
            action,
            state: NodeState::Complete,
            score: 1.0,
            approved: true,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn child(parent: &ThoughtNode, action: Action) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent: Some(parent.id),
            children: Vec::new(),
            depth: parent.depth + 1,
            action,
            state: NodeState::Pending,
            score: 0.0,
            approved: false,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expandable(&self, max_depth: u32) -> bool {
        self.state == NodeState::Complete && self.approved && !self.state.is_terminal() && self.depth < max_depth
    }

    pub fn mark_pruned(&mut self) {
        self.state = NodeState::Pruned;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = NodeState::Failed;
        self.error = Some(error.into());
    }

    pub fn mark_timed_out(&mut self) {
        self.state = NodeState::TimedOut;
    }

    pub fn is_concluding(&self) -> bool {
        matches!(self.action, Action::Conclude(_))
    }
}
