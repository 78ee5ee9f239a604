// Request/response value types for the orchestrator (C6).

use crate::router::RouteDecision;
use crate::supervision::ThoughtTree;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRequest {
    pub user_id: String,
    pub query: String,
}

impl OrchestrationRequest {
    pub fn new(user_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            query: query.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub request_id: String,
    pub content: String,
    pub confidence: f64,
    pub decision: RouteDecision,
    pub thought_tree: Option<ThoughtTree>,
}
