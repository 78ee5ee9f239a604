// Guardian: evaluates a candidate node for approval before it may be
// expanded. The default implementation is purely deterministic and
// makes no external calls; timeouts fail open (approved, reduced
// confidence) so meta-cognition never becomes a liveness hazard.

use super::node::{Action, ThoughtNode};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct GuardianResult {
    pub approved: bool,
    pub score: f64,
    pub confidence: f64,
    pub reason: String,
    pub risk_factors: Vec<String>,
    pub suggestions: Vec<String>,
}

impl GuardianResult {
    fn timeout() -> Self {
        Self {
            approved: true,
            score: 0.5,
            confidence: 0.5,
            reason: "guardian timed out, failing open".to_string(),
            risk_factors: vec!["timeout".to_string()],
            suggestions: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Guardian: Send + Sync {
    /// Evaluate `node` against `parent` and `siblings` within `deadline`.
    /// Implementations must honor the deadline cooperatively; callers
    /// apply a hard outer timeout regardless.
    async fn evaluate(
        &self,
        node: &ThoughtNode,
        parent: Option<&ThoughtNode>,
        siblings: &[ThoughtNode],
        deadline: Duration,
    ) -> GuardianResult;
}

const APPROVAL_THRESHOLD: f64 = 0.3;
const CIRCULAR_MARKERS: &[&str] = &["as i just said", "as mentioned before", "like i said"];
// Whitespace-tolerant so "ignore   previous\ninstructions" still matches.
const INJECTION_PATTERNS: &[&str] = &[
    r"ignore\s+previous\s+instructions",
    r"disregard\s+all\s+prior",
    r"system\s*prompt\s*:",
];

fn matches_any(patterns: &[&str], text: &str) -> Vec<String> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok().filter(|re| re.is_match(text)).map(|_| p.to_string()))
        .collect()
}

pub struct DefaultGuardian;

#[async_trait]
impl Guardian for DefaultGuardian {
    async fn evaluate(
        &self,
        node: &ThoughtNode,
        parent: Option<&ThoughtNode>,
        siblings: &[ThoughtNode],
        deadline: Duration,
    ) -> GuardianResult {
        let result = tokio::time::timeout(deadline, async { evaluate_sync(node, parent, siblings) }).await;
        result.unwrap_or_else(|_| GuardianResult::timeout())
    }
}

fn text_of(node: &ThoughtNode) -> &str {
    node.action.text()
}

fn evaluate_sync(node: &ThoughtNode, parent: Option<&ThoughtNode>, siblings: &[ThoughtNode]) -> GuardianResult {
    let mut score: f64 = 1.0;
    let mut risk_factors = Vec::new();
    let mut suggestions = Vec::new();
    let text = text_of(node);
    let lower = text.to_lowercase();

    for pattern in matches_any(INJECTION_PATTERNS, &lower) {
        score -= 0.6;
        risk_factors.push(format!("prompt-injection-like pattern: {pattern}"));
    }
    for marker in CIRCULAR_MARKERS {
        if lower.contains(marker) {
            score -= 0.4;
            risk_factors.push(format!("circular reasoning marker: {marker}"));
        }
    }

    if text.len() < 10 {
        score -= 0.2;
        risk_factors.push("content too short".to_string());
        suggestions.push("elaborate further before concluding".to_string());
    }
    if text.len() > 5000 {
        score -= 0.2;
        risk_factors.push("content too long".to_string());
    }

    if let Some(parent) = parent {
        let overlap = jaccard(text_of(parent), text);
        if overlap < 0.05 {
            score -= 0.15;
            risk_factors.push("low consistency with parent".to_string());
        }
        let contradiction_markers = ["however, actually", "that is wrong", "contradiction"];
        if contradiction_markers.iter().any(|m| lower.contains(m)) {
            score -= 0.25;
            risk_factors.push("contradiction marker present".to_string());
        }
    }

    for sibling in siblings {
        if sibling.id == node.id {
            continue;
        }
        let similarity = jaccard(text_of(sibling), text);
        if similarity > 0.8 {
            score -= 0.2;
            risk_factors.push("near-duplicate of a sibling".to_string());
            break;
        }
    }

    match &node.action {
        Action::ToolCall { tool, .. } if tool.trim().is_empty() => {
            score -= 0.3;
            risk_factors.push("tool call without a tool name".to_string());
        }
        Action::Conclude(content) if content.len() < 20 => {
            score -= 0.2;
            risk_factors.push("conclusion too short".to_string());
        }
        _ => {}
    }

    score = score.clamp(0.0, 1.0);
    let approved = score >= APPROVAL_THRESHOLD;
    let reason = if approved {
        "within acceptable risk bounds".to_string()
    } else {
        format!("score {score:.2} below approval threshold {APPROVAL_THRESHOLD}")
    };

    GuardianResult {
        approved,
        score,
        confidence: 1.0,
        reason,
        risk_factors,
        suggestions,
    }
}

/// Word-level Jaccard similarity, treated as "Jaccard-like" per spec.
fn jaccard(a: &str, b: &str) -> f64 {
    let set_a: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let set_b: std::collections::HashSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
