// Orchestrator (C6): wires C1-C5 per request, dispatches lobes in phase
// order, and wraps the result in supervised reasoning when enabled.

use super::request::{OrchestrationRequest, OrchestrationResult};
use crate::blackboard::{Blackboard, Category, ContextItem, MaskRegistry, Zone};
use crate::bus::{Event, EventType, NeuralBus};
use crate::health::{HealthMonitor, TriggerManager};
use crate::lobes::{Lobe, LobeInput};
use crate::metrics::CortexMetrics;
use crate::router::{Brain, BrainKind, BrainResult, Router};
use crate::supervision::{Action, Expander, StubExpander, SupervisionEngine};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Adapts a phase-ordered sequence of lobes into a `Brain`: each lobe
/// reads its filtered blackboard view, writes results back through the
/// blackboard's own API, and the orchestrator's bus/health/triggers are
/// driven at each phase boundary exactly as the dataflow describes.
pub struct LobeBrain {
    lobes: Vec<Arc<dyn Lobe>>,
    blackboard: Arc<Blackboard>,
    mask_registry: Arc<MaskRegistry>,
    bus: Arc<NeuralBus>,
    health: Arc<HealthMonitor>,
    triggers: Arc<TriggerManager>,
    metrics: Arc<CortexMetrics>,
}

impl LobeBrain {
    pub fn new(
        lobes: Vec<Arc<dyn Lobe>>,
        blackboard: Arc<Blackboard>,
        mask_registry: Arc<MaskRegistry>,
        bus: Arc<NeuralBus>,
        health: Arc<HealthMonitor>,
        triggers: Arc<TriggerManager>,
        metrics: Arc<CortexMetrics>,
    ) -> Self {
        Self {
            lobes,
            blackboard,
            mask_registry,
            bus,
            health,
            triggers,
            metrics,
        }
    }
}

#[async_trait]
impl Brain for LobeBrain {
    fn kind(&self) -> BrainKind {
        BrainKind::Local
    }

    async fn available(&self) -> bool {
        !self.lobes.is_empty()
    }

    async fn process(&self, _user_id: &str, query: &str) -> anyhow::Result<BrainResult> {
        let start = Instant::now();
        let mut last_output = None;

        for lobe in &self.lobes {
            let input = LobeInput {
                raw_input: query.to_string(),
                blackboard: self.blackboard.clone(),
                mask_registry: self.mask_registry.clone(),
            };
            let output = lobe.process(input).await?;

            let mut phase_event = Event::new(EventType::Phase, output.content.clone())
                .with_lobe(lobe.id().as_str())
                .with_confidence(output.confidence);
            phase_event.phase = Some(lobe.id().as_str().to_string());
            self.bus.publish(phase_event)?;
            self.metrics.bus_published_total.inc();
            self.metrics.record_dropped(self.bus.total_dropped());

            self.triggers.on_utilization_update(self.blackboard.stats().utilization);
            let report = self.health.check(&self.blackboard);
            self.metrics.record_utilization(report.stats.utilization);
            if self.health.needs_compaction(&report) {
                let result = self.health.compact(&self.blackboard);
                info!(promoted = result.promoted, evicted = result.evicted, "orchestrator: compaction ran");
                self.triggers.fire_compaction_complete(self.blackboard.stats().utilization);
            }
            self.triggers.fire_phase_complete();

            last_output = Some(output);
        }

        let output = last_output.ok_or_else(|| anyhow::anyhow!("no lobes configured"))?;
        Ok(BrainResult {
            success: true,
            content: output.content,
            confidence: output.confidence,
            tool_calls: Vec::new(),
            token_usage: None,
            latency: start.elapsed(),
        })
    }
}

pub struct Orchestrator {
    bus: Arc<NeuralBus>,
    blackboard: Arc<Blackboard>,
    mask_registry: Arc<MaskRegistry>,
    health: Arc<HealthMonitor>,
    triggers: Arc<TriggerManager>,
    supervision: Arc<SupervisionEngine>,
    router: Arc<Router>,
    expander: Arc<dyn Expander>,
    metrics: Arc<CortexMetrics>,
}

impl Orchestrator {
    pub fn new(
        bus: Arc<NeuralBus>,
        blackboard: Arc<Blackboard>,
        mask_registry: Arc<MaskRegistry>,
        health: Arc<HealthMonitor>,
        triggers: Arc<TriggerManager>,
        supervision: Arc<SupervisionEngine>,
        router: Arc<Router>,
        metrics: Arc<CortexMetrics>,
    ) -> Self {
        Self {
            bus,
            blackboard,
            mask_registry,
            health,
            triggers,
            supervision,
            router,
            expander: Arc::new(StubExpander),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<CortexMetrics> {
        &self.metrics
    }

    pub fn with_expander(mut self, expander: Arc<dyn Expander>) -> Self {
        self.expander = expander;
        self
    }

    pub fn mask_registry(&self) -> &Arc<MaskRegistry> {
        &self.mask_registry
    }

    pub async fn handle_request(
        &self,
        request: OrchestrationRequest,
        cancel: CancellationToken,
    ) -> anyhow::Result<OrchestrationResult> {
        let request_uuid = Uuid::new_v4();
        let request_id = request_uuid.to_string();

        self.blackboard.add(ContextItem::new(
            crate::lobes::LobeId::Monitor,
            Category::System,
            format!("request {request_id} started"),
            8,
            1.0,
            Zone::Critical,
        ))?;
        self.blackboard.add(ContextItem::new(
            crate::lobes::LobeId::Monitor,
            Category::User,
            request.query.clone(),
            (request.query.split_whitespace().count() as u32).max(1),
            0.8,
            Zone::Actionable,
        ))?;

        self.bus.publish(
            Event::new(EventType::Lifecycle, "request received").with_request_id(request_uuid),
        )?;
        self.metrics.bus_published_total.inc();
        self.metrics.record_utilization(self.blackboard.stats().utilization);

        if cancel.is_cancelled() {
            anyhow::bail!(crate::errors::CortexError::Cancelled);
        }

        let (result, decision) = self.router.process(&request.user_id, &request.query).await?;
        self.metrics.record_route_decision(match decision.brain {
            BrainKind::Local => "local",
            BrainKind::Frontier => "frontier",
        });

        let thought_tree = if self.supervision.enabled() {
            let build_timer = self.metrics.supervision_tree_build_seconds.start_timer();
            let tree = self
                .supervision
                .build_tree(
                    request_id.clone(),
                    &request.query,
                    Action::Think(result.content.clone()),
                    self.expander.clone(),
                    cancel.clone(),
                )
                .await?;
            build_timer.observe_duration();
            Some(tree)
        } else {
            None
        };

        self.bus.publish(
            Event::new(EventType::Lifecycle, "request completed")
                .with_request_id(request_uuid)
                .with_confidence(result.confidence),
        )?;
        self.metrics.bus_published_total.inc();

        Ok(OrchestrationResult {
            request_id,
            content: result.content,
            confidence: result.confidence,
            decision,
            thought_tree,
        })
    }
}
