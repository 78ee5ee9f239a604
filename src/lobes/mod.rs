// Lobe identity and contract.
//
// Lobes are excluded as external collaborators per the spec — only their
// interface is specified here. Twenty lobes are grouped into five
// layers (Perception, Cognitive, Social, Specialized, Executive); the
// orchestrator (C6) invokes them in phase order, each reading its
// filtered blackboard view and writing results back through the
// blackboard's own API (never by aliasing items).

use crate::blackboard::{Blackboard, MaskRegistry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A named cognitive component with a single responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LobeId {
    // Perception
    Sensory,
    Attention,
    Language,
    Pattern,
    // Cognitive
    Reasoning,
    Memory,
    Planning,
    Learning,
    // Social
    Empathy,
    Communication,
    Trust,
    Negotiation,
    // Specialized
    Creative,
    Analytical,
    Technical,
    Ethical,
    // Executive
    Inhibition,
    Decision,
    Goal,
    Monitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Perception,
    Cognitive,
    Social,
    Specialized,
    Executive,
}

impl LobeId {
    pub fn layer(&self) -> Layer {
        match self {
            LobeId::Sensory | LobeId::Attention | LobeId::Language | LobeId::Pattern => {
                Layer::Perception
            }
            LobeId::Reasoning | LobeId::Memory | LobeId::Planning | LobeId::Learning => {
                Layer::Cognitive
            }
            LobeId::Empathy | LobeId::Communication | LobeId::Trust | LobeId::Negotiation => {
                Layer::Social
            }
            LobeId::Creative | LobeId::Analytical | LobeId::Technical | LobeId::Ethical => {
                Layer::Specialized
            }
            LobeId::Inhibition | LobeId::Decision | LobeId::Goal | LobeId::Monitor => {
                Layer::Executive
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LobeId::Sensory => "sensory",
            LobeId::Attention => "attention",
            LobeId::Language => "language",
            LobeId::Pattern => "pattern",
            LobeId::Reasoning => "reasoning",
            LobeId::Memory => "memory",
            LobeId::Planning => "planning",
            LobeId::Learning => "learning",
            LobeId::Empathy => "empathy",
            LobeId::Communication => "communication",
            LobeId::Trust => "trust",
            LobeId::Negotiation => "negotiation",
            LobeId::Creative => "creative",
            LobeId::Analytical => "analytical",
            LobeId::Technical => "technical",
            LobeId::Ethical => "ethical",
            LobeId::Inhibition => "inhibition",
            LobeId::Decision => "decision",
            LobeId::Goal => "goal",
            LobeId::Monitor => "monitor",
        }
    }
}

/// Input handed to a lobe: the raw request text plus handles to the
/// shared blackboard and mask registry (the lobe reads its filtered
/// view via `MaskRegistry::filtered_view`, writes via `Blackboard::add`).
pub struct LobeInput {
    pub raw_input: String,
    pub blackboard: Arc<Blackboard>,
    pub mask_registry: Arc<MaskRegistry>,
}

#[derive(Debug, Clone)]
pub struct LobeOutput {
    pub content: String,
    pub confidence: f64,
}

/// Contract every lobe implementation satisfies. Lobes themselves are
/// out of scope for this core — this is the seam the orchestrator calls
/// through.
#[async_trait]
pub trait Lobe: Send + Sync {
    fn id(&self) -> LobeId;
    async fn process(&self, input: LobeInput) -> anyhow::Result<LobeOutput>;
}
