// ContextItem value type and supporting enums (C2).

use crate::lobes::LobeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The category a context item belongs to. Left open-ended beyond the
/// spec's illustrative list (system, user, memory, task, code, error,
/// emotion, …) with a few more lobes commonly write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    System,
    User,
    Memory,
    Task,
    Code,
    Error,
    Emotion,
    Goal,
    Tool,
    Feedback,
}

/// One of the three attention zones. LLM attention degrades in the
/// middle of long contexts ("lost-in-middle"); Critical and Actionable
/// are the high-attention head/tail bands, Supporting is the low-
/// attention middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Critical,
    Supporting,
    Actionable,
}

impl Zone {
    pub fn all() -> [Zone; 3] {
        [Zone::Critical, Zone::Supporting, Zone::Actionable]
    }
}

/// A single piece of structured context held by the blackboard.
///
/// Invariant: `zone` always matches the partition the item is stored in;
/// `tokens >= 0` (enforced by the `u32` type); `priority` is clamped to
/// `[0, 1]` on construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: Uuid,
    pub source_lobe: LobeId,
    pub category: Category,
    pub content: String,
    pub tokens: u32,
    pub priority: f64,
    pub zone: Zone,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ContextItem {
    pub fn new(
        source_lobe: LobeId,
        category: Category,
        content: impl Into<String>,
        tokens: u32,
        priority: f64,
        zone: Zone,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source_lobe,
            category,
            content: content.into(),
            tokens,
            priority: priority.clamp(0.0, 1.0),
            zone,
            created_at: now,
            last_accessed: now,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|e| e <= Utc::now()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_clamps_on_construction() {
        let item = ContextItem::new(
            LobeId::Reasoning,
            Category::Task,
            "hi",
            10,
            1.2,
            Zone::Critical,
        );
        assert_eq!(item.priority, 1.0);
        let item = ContextItem::new(
            LobeId::Reasoning,
            Category::Task,
            "hi",
            10,
            -1.2,
            Zone::Critical,
        );
        assert_eq!(item.priority, 0.0);
    }

    #[test]
    fn not_expired_without_expiry() {
        let item = ContextItem::new(LobeId::Memory, Category::Memory, "x", 1, 0.5, Zone::Supporting);
        assert!(!item.is_expired());
    }

    #[test]
    fn expired_once_past_expiry() {
        let item = ContextItem::new(LobeId::Memory, Category::Memory, "x", 1, 0.5, Zone::Supporting)
            .with_expiry(Utc::now() - chrono::Duration::seconds(1));
        assert!(item.is_expired());
    }
}
