// cortex-cli - interactive demo harness for the orchestrator.
// Wires the whole stack with an in-process local brain and an
// unconfigured frontier brain, then feeds stdin lines through
// `Orchestrator::handle_request`, printing the routed response.

use anyhow::Result;
use async_trait::async_trait;
use cortex::blackboard::{Blackboard, MaskRegistry};
use cortex::bus::NeuralBus;
use cortex::config::load_config;
use cortex::health::{HealthMonitor, TriggerManager};
use cortex::lobes::{Lobe, LobeId, LobeInput, LobeOutput};
use cortex::metrics::CortexMetrics;
use cortex::orchestrator::{Orchestrator, OrchestrationRequest};
use cortex::router::{Brain, BrainKind, BrainResult, InMemorySkillStore, Router, SkillStore};
use cortex::supervision::{DefaultGuardian, DefaultSelector, SupervisionEngine};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Single-pass placeholder reasoning lobe. Real lobe implementations are
/// out of scope for this core; this just proves the dataflow end to end.
struct PassthroughLobe;

#[async_trait]
impl Lobe for PassthroughLobe {
    fn id(&self) -> LobeId {
        LobeId::Reasoning
    }

    async fn process(&self, input: LobeInput) -> Result<LobeOutput> {
        Ok(LobeOutput {
            content: format!("considered: {}", input.raw_input.trim()),
            confidence: 0.6,
        })
    }
}

/// No frontier model is wired into this demo; the router will always
/// fall back to (or route directly to) the local brain.
struct NoFrontier;

#[async_trait]
impl Brain for NoFrontier {
    fn kind(&self) -> BrainKind {
        BrainKind::Frontier
    }

    async fn available(&self) -> bool {
        false
    }

    async fn process(&self, _user_id: &str, _query: &str) -> Result<BrainResult> {
        anyhow::bail!("no frontier brain configured for cortex-cli")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = load_config(None)?;

    let blackboard = Arc::new(Blackboard::new(config.zones.clone()));
    let mask_registry = Arc::new(MaskRegistry::new());
    let bus = Arc::new(NeuralBus::new(config.bus.history_size, config.bus.queue_capacity));
    let health = Arc::new(HealthMonitor::new(config.health.clone()));
    let triggers = Arc::new(TriggerManager::new(config.health.utilization_thresholds.clone()));
    let supervision = Arc::new(SupervisionEngine::new(
        config.supervision.clone(),
        Arc::new(DefaultGuardian),
        Arc::new(DefaultSelector),
    ));
    let metrics = Arc::new(CortexMetrics::new()?);

    let local_brain: Arc<dyn Brain> = Arc::new(cortex::orchestrator::LobeBrain::new(
        vec![Arc::new(PassthroughLobe)],
        blackboard.clone(),
        mask_registry.clone(),
        bus.clone(),
        health.clone(),
        triggers.clone(),
        metrics.clone(),
    ));
    let frontier_brain: Arc<dyn Brain> = Arc::new(NoFrontier);
    let skill_store: Arc<dyn SkillStore> = Arc::new(InMemorySkillStore::new());
    let router = Arc::new(Router::new(local_brain, frontier_brain, skill_store, config.router.clone()));

    let orchestrator =
        Orchestrator::new(bus, blackboard, mask_registry, health, triggers, supervision, router, metrics);

    eprintln!("cortex-cli ready. type a query, Ctrl-D to exit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let request = OrchestrationRequest::new("cli-user", line);
        match orchestrator.handle_request(request, CancellationToken::new()).await {
            Ok(result) => {
                info!(request_id = %result.request_id, brain = ?result.decision.brain, "cortex-cli: request completed");
                println!("[{:?}] {}", result.decision.brain, result.content);
                println!("  confidence: {:.2}  reason: {}", result.confidence, result.decision.reason);
            }
            Err(err) => {
                eprintln!("error: {err:#}");
            }
        }
        io::stdout().flush()?;
    }

    Ok(())
}
