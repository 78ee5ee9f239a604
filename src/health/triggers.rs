// TriggerManager (C3): event-driven, not polled. Thresholds fire once
// on upward crossing and reset only when utilization falls back below
// them; phase-complete, compaction-complete, and manual triggers fire
// unconditionally. Callbacks run asynchronously via `tokio::spawn`.

use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEvent {
    ThresholdCrossed(f64),
    PhaseComplete,
    CompactionComplete { new_utilization: f64 },
    Manual,
}

type Callback = Arc<dyn Fn(TriggerEvent) + Send + Sync>;

pub struct TriggerManager {
    thresholds: Vec<f64>,
    fired: RwLock<Vec<bool>>,
    callbacks: RwLock<Vec<Callback>>,
}

impl TriggerManager {
    pub fn new(thresholds: Vec<f64>) -> Self {
        let fired = vec![false; thresholds.len()];
        Self {
            thresholds,
            fired: RwLock::new(fired),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    pub fn register_callback(&self, callback: impl Fn(TriggerEvent) + Send + Sync + 'static) {
        self.callbacks.write().unwrap().push(Arc::new(callback));
    }

    fn dispatch(&self, event: TriggerEvent) {
        debug!(?event, "health: trigger fired");
        for callback in self.callbacks.read().unwrap().iter().cloned() {
            let event = event;
            tokio::spawn(async move { callback(event) });
        }
    }

    /// Called on every utilization recomputation. Fires each threshold
    /// at most once while utilization stays above it; a threshold resets
    /// once utilization drops below it, allowing it to re-fire on the
    /// next upward crossing.
    pub fn on_utilization_update(&self, utilization: f64) {
        let mut fired = self.fired.write().unwrap();
        for (i, threshold) in self.thresholds.iter().enumerate() {
            if utilization > *threshold {
                if !fired[i] {
                    fired[i] = true;
                    self.dispatch(TriggerEvent::ThresholdCrossed(*threshold));
                }
            } else {
                fired[i] = false;
            }
        }
    }

    pub fn fire_phase_complete(&self) {
        self.dispatch(TriggerEvent::PhaseComplete);
    }

    /// After compaction, reset fired flags consistent with the new
    /// (presumably lower) utilization so unchanged thresholds above it
    /// can fire again later.
    pub fn fire_compaction_complete(&self, new_utilization: f64) {
        {
            let mut fired = self.fired.write().unwrap();
            for (i, threshold) in self.thresholds.iter().enumerate() {
                fired[i] = new_utilization > *threshold;
            }
        }
        self.dispatch(TriggerEvent::CompactionComplete { new_utilization });
    }

    pub fn fire_manual(&self) {
        self.dispatch(TriggerEvent::Manual);
    }
}

impl Default for TriggerManager {
    fn default() -> Self {
        Self::new(vec![0.50, 0.75, 0.90])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn threshold_fires_once_then_resets_below_and_refires() {
        let manager = TriggerManager::new(vec![0.5]);
        let fire_count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fire_count);
        manager.register_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.on_utilization_update(0.6);
        manager.on_utilization_update(0.7);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);

        manager.on_utilization_update(0.4);
        manager.on_utilization_update(0.6);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fire_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn compaction_complete_resets_flags_based_on_new_utilization() {
        let manager = TriggerManager::new(vec![0.5, 0.9]);
        manager.on_utilization_update(0.95);
        manager.fire_compaction_complete(0.6);
        {
            let fired = manager.fired.read().unwrap();
            assert!(fired[0]);
            assert!(!fired[1]);
        }
        let fire_count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fire_count);
        manager.register_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.on_utilization_update(0.95);
        tokio::time::sleep(Duration::from_millis(20)).await;
        // threshold 0.9 re-fires since it had been reset; 0.5 stays fired.
        assert_eq!(fire_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_and_phase_complete_always_dispatch() {
        let manager = TriggerManager::new(vec![]);
        let fire_count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fire_count);
        manager.register_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.fire_manual();
        manager.fire_phase_complete();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fire_count.load(Ordering::SeqCst), 2);
    }
}
