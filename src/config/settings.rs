// Configuration structs for every tunable named in the design doc.
//
// Each sub-config carries the spec's stated default via `Default`; the
// loader layers an optional TOML file on top of these.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CortexConfig {
    pub bus: BusConfig,
    pub zones: ZoneConfig,
    pub health: HealthConfig,
    pub supervision: SupervisionConfig,
    pub router: RouterConfig,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            zones: ZoneConfig::default(),
            health: HealthConfig::default(),
            supervision: SupervisionConfig::default(),
            router: RouterConfig::default(),
        }
    }
}

/// Event bus tunables (C1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Size of the replay history ring.
    pub history_size: usize,
    /// Per-subscription bounded delivery queue capacity.
    pub queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            history_size: 1000,
            queue_capacity: 100,
        }
    }
}

/// Blackboard overflow behavior when an `Add` would exceed a zone's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    Reject,
    Evict,
}

/// Per-zone token budgets (C2). The global budget is the sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub critical_budget: u32,
    pub supporting_budget: u32,
    pub actionable_budget: u32,
    pub overflow_policy: OverflowPolicy,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            critical_budget: 2000,
            supporting_budget: 4000,
            actionable_budget: 2000,
            overflow_policy: OverflowPolicy::Evict,
        }
    }
}

impl ZoneConfig {
    pub fn total_budget(&self) -> u32 {
        self.critical_budget + self.supporting_budget + self.actionable_budget
    }
}

/// Health monitor thresholds (C3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Priority at/above which an item sitting in Supporting is "misplaced".
    pub lost_in_middle_priority: f64,
    /// Ratio of Supporting tokens over total above which LostInMiddle fires.
    pub supporting_ratio_threshold: f64,
    /// Utilization thresholds that each fire a trigger once on upward crossing.
    pub utilization_thresholds: Vec<f64>,
    /// Utilization above which compaction is needed.
    pub compaction_high_watermark: f64,
    /// Utilization compaction should bring the blackboard back down to.
    pub compaction_low_watermark: f64,
    /// Severity above which NeedsCompaction fires regardless of utilization.
    pub compaction_severity_threshold: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            lost_in_middle_priority: 0.7,
            supporting_ratio_threshold: 0.6,
            utilization_thresholds: vec![0.50, 0.75, 0.90],
            compaction_high_watermark: 0.85,
            compaction_low_watermark: 0.75,
            compaction_severity_threshold: 0.5,
        }
    }
}

/// Supervision engine tunables (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisionConfig {
    pub max_branches: usize,
    pub max_depth: u32,
    pub max_nodes: usize,
    pub prune_threshold: f64,
    #[serde(with = "duration_millis")]
    pub guardian_timeout: Duration,
    #[serde(with = "duration_millis")]
    pub node_timeout: Duration,
    pub enabled: bool,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            max_branches: 3,
            max_depth: 4,
            max_nodes: 20,
            prune_threshold: 0.3,
            guardian_timeout: Duration::from_millis(200),
            node_timeout: Duration::from_secs(5),
            enabled: true,
        }
    }
}

/// Router + skill store tunables (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Minimum skill success rate to route local on a matched skill.
    pub skill_threshold: f64,
    /// For "moderate" complexity queries, prefer local over frontier.
    pub prefer_local: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            skill_threshold: 0.8,
            prefer_local: false,
        }
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
