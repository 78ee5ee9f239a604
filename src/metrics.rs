// Ambient observability (not a spec module; the Non-goals scope out UI
// and wire-protocol concerns, not internal counters). Grounded on
// `finch`'s src/metrics/ RequestMetric/MetricsLogger shape, built here
// on `prometheus` registries instead of the teacher's in-memory log.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub struct CortexMetrics {
    pub registry: Registry,
    pub bus_published_total: IntCounter,
    /// Sum of per-subscription drop counts as of the last sample — a
    /// gauge, not a counter, since `NeuralBus::total_dropped` is itself
    /// a running total rather than a per-call delta.
    pub bus_dropped_total: IntGauge,
    pub blackboard_utilization: IntGauge,
    pub supervision_tree_build_seconds: Histogram,
    pub router_decisions_total: IntCounterVec,
}

impl CortexMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let bus_published_total =
            IntCounter::new("cortex_bus_published_total", "events published on the neural bus")?;
        let bus_dropped_total = IntGauge::new(
            "cortex_bus_dropped_total",
            "events dropped by a full per-subscription queue, summed across subscriptions",
        )?;
        let blackboard_utilization = IntGauge::new(
            "cortex_blackboard_utilization_permille",
            "blackboard token utilization in parts per thousand",
        )?;
        let supervision_tree_build_seconds = Histogram::with_opts(HistogramOpts::new(
            "cortex_supervision_tree_build_seconds",
            "wall-clock time to build and score a thought tree",
        ))?;
        let router_decisions_total = IntCounterVec::new(
            Opts::new("cortex_router_decisions_total", "routing decisions by chosen brain"),
            &["brain"],
        )?;

        registry.register(Box::new(bus_published_total.clone()))?;
        registry.register(Box::new(bus_dropped_total.clone()))?;
        registry.register(Box::new(blackboard_utilization.clone()))?;
        registry.register(Box::new(supervision_tree_build_seconds.clone()))?;
        registry.register(Box::new(router_decisions_total.clone()))?;

        Ok(Self {
            registry,
            bus_published_total,
            bus_dropped_total,
            blackboard_utilization,
            supervision_tree_build_seconds,
            router_decisions_total,
        })
    }

    pub fn record_utilization(&self, utilization: f64) {
        self.blackboard_utilization.set((utilization * 1000.0) as i64);
    }

    pub fn record_dropped(&self, total_dropped: u64) {
        self.bus_dropped_total.set(total_dropped as i64);
    }

    pub fn record_route_decision(&self, brain: &str) {
        self.router_decisions_total.with_label_values(&[brain]).inc();
    }
}

impl Default for CortexMetrics {
    fn default() -> Self {
        Self::new().expect("metric descriptors are static and registration cannot fail")
    }
}
