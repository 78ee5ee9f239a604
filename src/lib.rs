// cortex - multi-lobe cognitive orchestration core
// Library exports

pub mod blackboard; // Three-zone token-budgeted shared context store (C2)
pub mod bus; // Typed pub/sub event distributor (C1)
pub mod config; // Tunables and TOML-backed loader for every component
pub mod errors; // Shared error taxonomy (CortexError / CortexResult)
pub mod health; // LostInMiddle detection, scoring, compaction, triggers (C3)
pub mod lobes; // Lobe identity and the orchestrator-facing Lobe contract
pub mod metrics; // Prometheus-backed counters/gauges/histograms
pub mod orchestrator; // Per-request wiring of C1-C5 (C6)
pub mod router; // Dual-brain routing and skill memory (C5)
pub mod supervision; // Tree-of-thought supervision (C4)

pub use errors::{CortexError, CortexResult};
