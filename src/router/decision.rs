// Router (C5): decides which brain processes a request, applies a
// fallback on local failure, and records captured skills from frontier
// successes. Decision order and reasons are grounded on `finch`'s
// RouteDecision/ForwardReason shape (src/router/decision.rs).

use super::classify::{classify, Complexity};
use super::skill::{normalize_intent, Skill, SkillStore};
use crate::config::RouterConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrainKind {
    Local,
    Frontier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrainResult {
    pub success: bool,
    pub content: String,
    pub confidence: f64,
    pub tool_calls: Vec<ToolCall>,
    pub token_usage: Option<u32>,
    pub latency: Duration,
}

#[async_trait]
pub trait Brain: Send + Sync {
    fn kind(&self) -> BrainKind;
    async fn available(&self) -> bool;
    async fn process(&self, user_id: &str, query: &str) -> anyhow::Result<BrainResult>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub brain: BrainKind,
    pub reason: String,
    pub matched_skill: Option<Skill>,
    pub confidence: f64,
}

pub struct Router {
    local: Arc<dyn Brain>,
    frontier: Arc<dyn Brain>,
    skill_store: Arc<dyn SkillStore>,
    config: RouterConfig,
}

impl Router {
    pub fn new(
        local: Arc<dyn Brain>,
        frontier: Arc<dyn Brain>,
        skill_store: Arc<dyn SkillStore>,
        config: RouterConfig,
    ) -> Self {
        Self {
            local,
            frontier,
            skill_store,
            config,
        }
    }

    pub async fn route(&self, user_id: &str, query: &str) -> RouteDecision {
        if !self.frontier.available().await {
            let decision = RouteDecision {
                brain: BrainKind::Local,
                reason: "frontier unavailable".to_string(),
                matched_skill: None,
                confidence: 1.0,
            };
            info!(brain = ?decision.brain, reason = %decision.reason, "router: decision");
            return decision;
        }

        let matches = self.skill_store.search_skills(user_id, query, 1).await;
        if let Some(top) = matches.into_iter().next() {
            if top.success_rate >= self.config.skill_threshold {
                let decision = RouteDecision {
                    brain: BrainKind::Local,
                    reason: format!("matched skill '{}' with success rate {:.2}", top.intent, top.success_rate),
                    confidence: top.success_rate,
                    matched_skill: Some(top),
                };
                info!(brain = ?decision.brain, reason = %decision.reason, "router: decision");
                return decision;
            }
        }

        let decision = match classify(query) {
            Complexity::Trivial | Complexity::Simple => RouteDecision {
                brain: BrainKind::Local,
                reason: "trivial or simple complexity".to_string(),
                matched_skill: None,
                confidence: 0.9,
            },
            Complexity::Moderate if self.config.prefer_local => RouteDecision {
                brain: BrainKind::Local,
                reason: "moderate complexity, local preferred".to_string(),
                matched_skill: None,
                confidence: 0.6,
            },
            Complexity::Moderate => RouteDecision {
                brain: BrainKind::Frontier,
                reason: "moderate complexity, frontier preferred".to_string(),
                matched_skill: None,
                confidence: 0.6,
            },
            Complexity::Complex | Complexity::Novel => RouteDecision {
                brain: BrainKind::Frontier,
                reason: "complex or novel query".to_string(),
                matched_skill: None,
                confidence: 0.8,
            },
        };
        info!(brain = ?decision.brain, reason = %decision.reason, "router: decision");
        decision
    }

    pub async fn process(&self, user_id: &str, query: &str) -> anyhow::Result<(BrainResult, RouteDecision)> {
        let decision = self.route(user_id, query).await;
        let chosen = match decision.brain {
            BrainKind::Local => self.local.as_ref(),
            BrainKind::Frontier => self.frontier.as_ref(),
        };

        match chosen.process(user_id, query).await {
            Ok(result) if decision.brain == BrainKind::Frontier => {
                self.record_skill(user_id, query, &result).await;
                Ok((result, decision))
            }
            Ok(result) => Ok((result, decision)),
            Err(err) if decision.brain == BrainKind::Local && self.frontier.available().await => {
                info!(error = %err, "router: local brain failed, falling back to frontier");
                let result = self.frontier.process(user_id, query).await?;
                let fallback_decision = RouteDecision {
                    brain: BrainKind::Frontier,
                    reason: "fallback: local brain failed".to_string(),
                    matched_skill: decision.matched_skill,
                    confidence: decision.confidence,
                };
                self.record_skill(user_id, query, &result).await;
                Ok((result, fallback_decision))
            }
            Err(err) => Err(err),
        }
    }

    async fn record_skill(&self, user_id: &str, query: &str, result: &BrainResult) {
        if !result.success {
            return;
        }
        let intent = normalize_intent(query);
        let (tool, params) = match result.tool_calls.first() {
            Some(call) => (call.tool.clone(), call.params.clone()),
            None => ("reasoning".to_string(), HashMap::new()),
        };
        self.skill_store.store_skill(user_id, &intent, &tool, params, true).await;
    }
}
