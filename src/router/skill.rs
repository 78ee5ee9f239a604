// Skill + SkillStore (C5): captured intent -> (tool, params) patterns
// with a running success rate, keyed by (user, intent, tool) so writes
// stay idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillSource {
    Local,
    Frontier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: String,
    pub intent: String,
    pub tool: String,
    pub params: HashMap<String, String>,
    pub success_rate: f64,
    pub use_count: u64,
    pub source: SkillSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lowercases, trims, and collapses whitespace so near-identical queries
/// map to the same skill key.
pub fn normalize_intent(query: &str) -> String {
    query.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
pub trait SkillStore: Send + Sync {
    /// Skills for `user_id` whose intent is close to `query`, ordered by
    /// success rate descending, limited to `limit` entries.
    async fn search_skills(&self, user_id: &str, query: &str, limit: usize) -> Vec<Skill>;

    /// Upsert by (user_id, intent, tool): an existing match has its
    /// success rate folded in as a running mean and its use count
    /// incremented; otherwise a new skill is created.
    async fn store_skill(
        &self,
        user_id: &str,
        intent: &str,
        tool: &str,
        params: HashMap<String, String>,
        success: bool,
    ) -> Skill;
}

#[derive(Default)]
pub struct InMemorySkillStore {
    skills: DashMap<(String, String, String), Skill>,
}

impl InMemorySkillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Short stable digest of a (user, intent, tool) key, for log correlation
/// without printing raw user queries.
fn skill_fingerprint(user_id: &str, intent: &str, tool: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b"\0");
    hasher.update(intent.as_bytes());
    hasher.update(b"\0");
    hasher.update(tool.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 8)
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes.iter().take(n).map(|b| format!("{b:02x}")).collect()
}

fn intent_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let set_a: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let set_b: std::collections::HashSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

#[async_trait]
impl SkillStore for InMemorySkillStore {
    async fn search_skills(&self, user_id: &str, query: &str, limit: usize) -> Vec<Skill> {
        let normalized = normalize_intent(query);
        let mut matches: Vec<(f64, Skill)> = self
            .skills
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| e.value().clone())
            .map(|skill| (intent_similarity(&normalized, &skill.intent), skill))
            .filter(|(similarity, _)| *similarity > 0.0)
            .collect();

        matches.sort_by(|a, b| {
            b.1.success_rate
                .partial_cmp(&a.1.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal))
        });
        matches.into_iter().map(|(_, skill)| skill).take(limit).collect()
    }

    async fn store_skill(
        &self,
        user_id: &str,
        intent: &str,
        tool: &str,
        params: HashMap<String, String>,
        success: bool,
    ) -> Skill {
        let normalized = normalize_intent(intent);
        let key = (user_id.to_string(), normalized.clone(), tool.to_string());
        let now = Utc::now();

        debug!(fingerprint = %skill_fingerprint(user_id, &normalized, tool), success, "router: storing skill");

        let mut entry = self.skills.entry(key).or_insert_with(|| Skill {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            intent: normalized.clone(),
            tool: tool.to_string(),
            params: params.clone(),
            success_rate: 0.0,
            use_count: 0,
            source: SkillSource::Local,
            created_at: now,
            updated_at: now,
        });

        let outcome = if success { 1.0 } else { 0.0 };
        entry.success_rate = (entry.success_rate * entry.use_count as f64 + outcome) / (entry.use_count as f64 + 1.0);
        entry.use_count += 1;
        entry.params = params;
        entry.updated_at = now;
        entry.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic_and_key_sensitive() {
        let a = skill_fingerprint("u1", "send an email", "email");
        let b = skill_fingerprint("u1", "send an email", "email");
        let c = skill_fingerprint("u1", "send an email", "slack");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn store_skill_is_idempotent_on_intent_tool_key() {
        let store = InMemorySkillStore::new();
        store
            .store_skill("u1", "send an email", "email", HashMap::new(), true)
            .await;
        let skill = store
            .store_skill("u1", "send an email", "email", HashMap::new(), true)
            .await;
        assert_eq!(skill.use_count, 2);
        assert_eq!(skill.success_rate, 1.0);

        let matches = store.search_skills("u1", "send an email", 10).await;
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn success_rate_is_a_running_mean() {
        let store = InMemorySkillStore::new();
        store.store_skill("u1", "book flight", "flights", HashMap::new(), true).await;
        let skill = store
            .store_skill("u1", "book flight", "flights", HashMap::new(), false)
            .await;
        assert_eq!(skill.use_count, 2);
        assert_eq!(skill.success_rate, 0.5);
    }

    #[tokio::test]
    async fn search_limits_and_orders_by_success_rate() {
        let store = InMemorySkillStore::new();
        store.store_skill("u1", "reboot server", "ops", HashMap::new(), false).await;
        store.store_skill("u1", "reboot device", "ops", HashMap::new(), true).await;
        let matches = store.search_skills("u1", "reboot", 1).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].success_rate, 1.0);
    }
}
