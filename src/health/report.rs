// Health report value types and scoring (C3).

use crate::blackboard::{Blackboard, BlackboardStats, Zone};
use crate::config::HealthConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

/// A detected context-quality degradation pattern. LostInMiddle is the
/// only mandatory pattern; the enum leaves room for more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    LostInMiddle { severity: f64, misplaced_count: usize },
}

impl Pattern {
    pub fn severity(&self) -> f64 {
        match self {
            Pattern::LostInMiddle { severity, .. } => *severity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub score: u8,
    pub patterns: Vec<Pattern>,
    pub recommendations: Vec<String>,
    pub stats: BlackboardStats,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub check_duration: Duration,
}

impl HealthReport {
    pub fn needs_compaction(&self, config: &HealthConfig) -> bool {
        self.stats.utilization > config.compaction_high_watermark
            || self
                .patterns
                .iter()
                .any(|p| p.severity() > config.compaction_severity_threshold)
    }
}

/// Detect the LostInMiddle pattern: high-priority items stranded in
/// Supporting, or Supporting's share of total tokens above `R`.
pub(super) fn detect_patterns(bb: &Blackboard, config: &HealthConfig) -> Vec<Pattern> {
    let supporting = bb.get_zone(Zone::Supporting);
    let misplaced: Vec<_> = supporting
        .iter()
        .filter(|item| item.priority >= config.lost_in_middle_priority)
        .collect();

    let stats = bb.stats();
    let supporting_tokens = stats.zone_tokens.get(&Zone::Supporting).copied().unwrap_or(0);
    let ratio_overflow = if stats.total_tokens == 0 {
        0.0
    } else {
        let ratio = supporting_tokens as f64 / stats.total_tokens as f64;
        (ratio - config.supporting_ratio_threshold).max(0.0)
    };

    if misplaced.is_empty() && ratio_overflow <= 0.0 {
        return Vec::new();
    }

    let count_severity = if supporting.is_empty() {
        0.0
    } else {
        misplaced.len() as f64 / supporting.len() as f64
    };
    let severity = (count_severity * 0.6 + ratio_overflow * 0.4).clamp(0.0, 1.0);

    vec![Pattern::LostInMiddle {
        severity,
        misplaced_count: misplaced.len(),
    }]
}

pub(super) fn recommendations_for(patterns: &[Pattern], stats: &BlackboardStats) -> Vec<String> {
    let mut out = Vec::new();
    for pattern in patterns {
        match pattern {
            Pattern::LostInMiddle { misplaced_count, .. } if *misplaced_count > 0 => out.push(
                format!("promote {misplaced_count} high-priority item(s) out of the Supporting zone"),
            ),
            Pattern::LostInMiddle { .. } => {
                out.push("reduce the Supporting zone's share of total tokens".to_string())
            }
        }
    }
    if stats.utilization > 0.9 {
        out.push("blackboard utilization above 90%: compact or evict".to_string());
    }
    if stats.total_items > 0 && stats.zone_tokens.get(&Zone::Critical).copied().unwrap_or(0) == 0 {
        out.push("no items held in the Critical zone".to_string());
    }
    if stats.total_items > 3 && stats.zone_tokens.get(&Zone::Actionable).copied().unwrap_or(0) == 0 {
        out.push("no items held in the Actionable zone".to_string());
    }
    out
}

/// Start at 100 and subtract for each degradation signal, clamped to [0,100].
pub(super) fn score(stats: &BlackboardStats, patterns: &[Pattern]) -> u8 {
    let mut score: f64 = 100.0;

    let pattern_penalty: f64 = patterns.iter().map(|p| p.severity() * 50.0).sum::<f64>().min(50.0);
    score -= pattern_penalty;

    let utilization_penalty = if stats.utilization > 0.9 {
        20.0
    } else if stats.utilization > 0.75 {
        10.0
    } else if stats.utilization > 0.5 {
        5.0
    } else {
        0.0
    };
    score -= utilization_penalty;

    let supporting_tokens = stats.zone_tokens.get(&Zone::Supporting).copied().unwrap_or(0);
    let middle_ratio = if stats.total_tokens == 0 {
        0.0
    } else {
        supporting_tokens as f64 / stats.total_tokens as f64
    };
    if middle_ratio > 0.6 {
        score -= ((middle_ratio - 0.6) / 0.4 * 15.0).min(15.0);
    }

    let mut structural_penalty = 0.0;
    if stats.total_items > 0 && stats.zone_tokens.get(&Zone::Critical).copied().unwrap_or(0) == 0 {
        structural_penalty += 7.5;
    }
    if stats.total_items > 3 && stats.zone_tokens.get(&Zone::Actionable).copied().unwrap_or(0) == 0 {
        structural_penalty += 7.5;
    }
    score -= structural_penalty.min(15.0);

    score.clamp(0.0, 100.0) as u8
}

pub(super) fn status_for(score: u8) -> HealthStatus {
    if score >= 80 {
        HealthStatus::Healthy
    } else if score >= 50 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Critical
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blackboard::{Category, ContextItem};
    use crate::config::ZoneConfig;
    use crate::lobes::LobeId;

    /// S3: a single high-priority item stranded in Supporting.
    #[test]
    fn lost_in_middle_detected_for_lone_high_priority_item() {
        let bb = Blackboard::new(ZoneConfig::default());
        bb.add(ContextItem::new(
            LobeId::Reasoning,
            Category::Task,
            "x",
            100,
            0.9,
            Zone::Supporting,
        ))
        .unwrap();

        let config = HealthConfig::default();
        let patterns = detect_patterns(&bb, &config);
        assert_eq!(patterns.len(), 1);
        match &patterns[0] {
            Pattern::LostInMiddle { severity, misplaced_count } => {
                assert!(*severity > 0.0);
                assert_eq!(*misplaced_count, 1);
            }
        }
        let recs = recommendations_for(&patterns, &bb.stats());
        assert!(recs.iter().any(|r| r.contains("promote")));
    }

    #[test]
    fn empty_blackboard_has_no_patterns_and_full_score() {
        let bb = Blackboard::new(ZoneConfig::default());
        let patterns = detect_patterns(&bb, &HealthConfig::default());
        assert!(patterns.is_empty());
        assert_eq!(score(&bb.stats(), &patterns), 100);
        assert_eq!(status_for(100), HealthStatus::Healthy);
    }

    #[test]
    fn score_is_clamped_and_monotonic_with_severity() {
        let stats = BlackboardStats::default();
        let low = score(&stats, &[Pattern::LostInMiddle { severity: 0.1, misplaced_count: 1 }]);
        let high = score(&stats, &[Pattern::LostInMiddle { severity: 1.0, misplaced_count: 10 }]);
        assert!(high <= low);
        assert!(high <= 100 && low <= 100);
    }
}
