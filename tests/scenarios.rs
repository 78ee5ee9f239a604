// Cross-module integration scenarios (S1-S6), exercising the public API
// surface end to end rather than any one component's internals.

use async_trait::async_trait;
use cortex::blackboard::{Blackboard, Category, ContextItem, Zone};
use cortex::bus::{Event, EventType, NeuralBus};
use cortex::config::{OverflowPolicy, RouterConfig, SupervisionConfig, ZoneConfig};
use cortex::health::HealthMonitor;
use cortex::lobes::LobeId;
use cortex::router::{Brain, BrainKind, BrainResult, InMemorySkillStore, Router};
use cortex::supervision::{Action, DefaultGuardian, Guardian, StubExpander, SupervisionEngine, ThoughtNode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// S1 - event fan-out: N=10 wildcard subscribers, M=100 publishes; each
// subscriber ends up with handled + dropped == 100.
#[tokio::test]
async fn s1_event_fan_out_conserves_handled_plus_dropped() {
    let bus = Arc::new(NeuralBus::new(1000, 100));
    let mut counters = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..10 {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let id = bus
            .subscribe("", Arc::new(move |_event| {
                c.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        counters.push(counter);
        ids.push(id);
    }

    for i in 0..100 {
        bus.publish(Event::new(EventType::Heartbeat, format!("tick {i}"))).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    for (counter, id) in counters.iter().zip(ids.iter()) {
        let handled = counter.load(Ordering::Relaxed) as u64;
        let dropped = bus.dropped_count(*id).unwrap();
        assert_eq!(handled + dropped, 100);
    }
}

// S2 - blackboard eviction: 12 items of 10 tokens each in Supporting,
// monotonically increasing priority, budget 100 per zone. The lowest-
// priority (earliest) items are evicted, the highest-priority survive.
#[test]
fn s2_blackboard_eviction_keeps_highest_priority_within_budget() {
    let config = ZoneConfig {
        critical_budget: 100,
        supporting_budget: 100,
        actionable_budget: 100,
        overflow_policy: OverflowPolicy::Evict,
    };
    let bb = Blackboard::new(config);
    let mut ids = Vec::new();
    for i in 0..12 {
        let priority = ((i + 1) as f64) * 0.1;
        let item = ContextItem::new(LobeId::Memory, Category::Task, format!("item {i}"), 10, priority, Zone::Supporting);
        ids.push(item.id);
        bb.add(item).unwrap();
    }

    let stats = bb.stats();
    assert!(stats.zone_tokens[&Zone::Supporting] <= 100);
    assert!(bb.get(ids[0]).is_none());
    assert!(bb.get(ids[1]).is_none());
    assert!(bb.get(ids[11]).is_some());
    assert!(bb.get(ids[10]).is_some());
}

// S3 - lost-in-middle detection: one lone high-priority item sitting in
// Supporting triggers a LostInMiddle pattern and a promotion recommendation.
#[test]
fn s3_lost_in_middle_detected_for_lone_high_priority_item() {
    let bb = Blackboard::new(ZoneConfig::default());
    bb.add(ContextItem::new(LobeId::Memory, Category::Task, "stranded fact", 100, 0.9, Zone::Supporting))
        .unwrap();

    let monitor = HealthMonitor::new(cortex::config::HealthConfig::default());
    let report = monitor.check(&bb);

    let lost_in_middle = report.patterns.iter().find_map(|p| match p {
        cortex::health::Pattern::LostInMiddle { severity, .. } if *severity > 0.0 => Some(*severity),
        _ => None,
    });
    assert!(lost_in_middle.is_some());
    assert!(report.recommendations.iter().any(|r| r.to_lowercase().contains("promot")));
}

// S4 - thought-tree depth cap: MaxDepth=2, MaxBranches=2, an expander
// returning two children every call. max_depth <= 2, node_count <= 7,
// best_path ends at depth <= 2.
#[tokio::test]
async fn s4_thought_tree_respects_depth_and_node_caps() {
    let config = SupervisionConfig {
        max_branches: 2,
        max_depth: 2,
        max_nodes: 20,
        prune_threshold: 0.3,
        guardian_timeout: Duration::from_millis(200),
        node_timeout: Duration::from_secs(5),
        enabled: true,
    };
    let engine = SupervisionEngine::new(config, Arc::new(DefaultGuardian), Arc::new(cortex::supervision::DefaultSelector));

    let tree = engine
        .build_tree(
            "s4-request",
            "what should we do next",
            Action::Think("initial thought, reasonably long and well formed".to_string()),
            Arc::new(StubExpander),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(tree.max_depth() <= 2);
    assert!(tree.node_count() <= 7);
    if let Some(path) = &tree.best_path {
        let last = tree.get(*path.last().unwrap()).unwrap();
        assert!(last.depth <= 2);
    }
}

// S5 - guardian rejection: a thought containing a circular marker is
// rejected outright or scored below the default approval threshold,
// with non-empty risk factors.
#[tokio::test]
async fn s5_guardian_rejects_circular_reasoning() {
    let node = ThoughtNode::root(Action::Think(
        "As I just said, the same conclusion holds here too.".to_string(),
    ));
    let result = DefaultGuardian.evaluate(&node, None, &[], Duration::from_millis(200)).await;

    assert!(!result.risk_factors.is_empty());
    assert!(!result.approved || result.score < 0.3);
}

// S6 - router fallback: local brain errors, frontier is available and
// succeeds; Router.process returns the frontier result with a fallback
// reason.
struct FailingLocal;
#[async_trait]
impl Brain for FailingLocal {
    fn kind(&self) -> BrainKind {
        BrainKind::Local
    }
    async fn available(&self) -> bool {
        true
    }
    async fn process(&self, _user_id: &str, _query: &str) -> anyhow::Result<BrainResult> {
        anyhow::bail!("local brain exploded")
    }
}

struct SucceedingFrontier;
#[async_trait]
impl Brain for SucceedingFrontier {
    fn kind(&self) -> BrainKind {
        BrainKind::Frontier
    }
    async fn available(&self) -> bool {
        true
    }
    async fn process(&self, _user_id: &str, query: &str) -> anyhow::Result<BrainResult> {
        Ok(BrainResult {
            success: true,
            content: format!("frontier handled: {query}"),
            confidence: 0.9,
            tool_calls: Vec::new(),
            token_usage: None,
            latency: Duration::from_millis(1),
        })
    }
}

#[tokio::test]
async fn s6_router_falls_back_to_frontier_on_local_failure() {
    let router = Router::new(
        Arc::new(FailingLocal),
        Arc::new(SucceedingFrontier),
        Arc::new(InMemorySkillStore::new()),
        RouterConfig { skill_threshold: 1.1, prefer_local: true },
    );

    let (result, decision) = router.process("u1", "do something moderately complex here").await.unwrap();
    assert!(result.success);
    assert_eq!(decision.brain, BrainKind::Frontier);
    assert!(decision.reason.contains("fallback"));
}
