// HealthMonitor (C3): runs a full Check over a Blackboard, and applies
// the two-watermark compaction policy once NeedsCompaction fires.

use super::report::{detect_patterns, recommendations_for, score, status_for};
use super::report::HealthReport;
use crate::blackboard::{Blackboard, Zone};
use crate::config::HealthConfig;
use chrono::Utc;
use std::time::Instant;
use tracing::info;

pub struct HealthMonitor {
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    /// Full health check: detect patterns, score, classify status.
    pub fn check(&self, bb: &Blackboard) -> HealthReport {
        let start = Instant::now();
        let patterns = detect_patterns(bb, &self.config);
        let stats = bb.stats();
        let score = score(&stats, &patterns);
        let recommendations = recommendations_for(&patterns, &stats);

        HealthReport {
            status: status_for(score),
            score,
            patterns,
            recommendations,
            stats,
            timestamp: Utc::now(),
            check_duration: start.elapsed(),
        }
    }

    /// Cheap status classification from utilization alone, skipping
    /// pattern detection. Useful on the hot path where a full check is
    /// too expensive to run on every publish.
    pub fn quick_check(&self, bb: &Blackboard) -> (super::report::HealthStatus, u8) {
        let utilization = bb.stats().utilization;
        let penalty = if utilization > self.config.compaction_high_watermark {
            20.0
        } else if utilization > 0.75 {
            10.0
        } else if utilization > 0.5 {
            5.0
        } else {
            0.0
        };
        let score = (100.0 - penalty).clamp(0.0, 100.0) as u8;
        (status_for(score), score)
    }

    pub fn needs_compaction(&self, report: &HealthReport) -> bool {
        report.needs_compaction(&self.config)
    }

    /// Priority an operator should assign to acting on `report`: the
    /// larger of the utilization overshoot and the worst pattern severity.
    pub fn compaction_priority(&self, report: &HealthReport) -> f64 {
        let utilization_pressure =
            (report.stats.utilization - self.config.compaction_high_watermark).max(0.0);
        let pattern_pressure = report
            .patterns
            .iter()
            .map(|p| p.severity())
            .fold(0.0_f64, f64::max);
        utilization_pressure.max(pattern_pressure).clamp(0.0, 1.0)
    }

    /// Rank items within the Supporting zone by ascending priority
    /// (eviction order), then evict oldest-inserted low-priority items
    /// until utilization drops at or below the low watermark. Items
    /// flagged as better suited to Critical or Actionable (priority at
    /// or above the lost-in-middle threshold) are promoted instead of
    /// evicted, when the destination zone has room.
    pub fn compact(&self, bb: &Blackboard) -> CompactionResult {
        let mut promoted = 0usize;
        let mut evicted = 0usize;

        let mut supporting = bb.get_zone(Zone::Supporting);
        supporting.sort_by(|a, b| {
            a.priority
                .partial_cmp(&b.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.created_at.cmp(&b.created_at))
        });

        for item in supporting.iter().rev() {
            if item.priority < self.config.lost_in_middle_priority {
                continue;
            }
            let destination = if item.priority >= 0.9 {
                Zone::Critical
            } else {
                Zone::Actionable
            };
            let mut promoted_item = item.clone();
            promoted_item.zone = destination;
            if bb.remove(item.id).is_ok() {
                if bb.add(promoted_item).is_ok() {
                    promoted += 1;
                } else {
                    // Destination zone had no room; put it back where it was.
                    let mut restored = item.clone();
                    restored.zone = Zone::Supporting;
                    let _ = bb.add(restored);
                }
            }
        }

        let low_watermark = self.config.compaction_low_watermark;
        while bb.stats().utilization > low_watermark {
            let mut remaining = bb.get_zone(Zone::Supporting);
            remaining.sort_by(|a, b| {
                a.priority
                    .partial_cmp(&b.priority)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.created_at.cmp(&b.created_at))
            });
            let Some(victim) = remaining.first() else {
                break;
            };
            if bb.remove(victim.id).is_err() {
                break;
            }
            evicted += 1;
        }

        info!(promoted, evicted, "health: compaction complete");
        CompactionResult { promoted, evicted }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionResult {
    pub promoted: usize,
    pub evicted: usize,
}
