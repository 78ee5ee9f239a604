// The Neural Bus (C1) — typed pub/sub with bounded replay history and
// non-blocking, per-subscription delivery.
//
// Indices: one DashMap from id -> record (primary), one DashMap from event
// type string -> set of ids (typed), one DashSet of wildcard ids. Every
// id in a secondary index is guaranteed to exist in the primary map;
// both are updated inside the same subscribe/unsubscribe call so they
// never drift.

use super::event::Event;
use super::subscription::{Handler, SubscriptionId, SubscriptionRecord};
use crate::errors::{CortexError, CortexResult};
use dashmap::{DashMap, DashSet};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{debug, info};

pub struct NeuralBus {
    subs: DashMap<SubscriptionId, SubscriptionRecord>,
    typed_index: DashMap<String, DashSet<SubscriptionId>>,
    wildcard: DashSet<SubscriptionId>,
    history: RwLock<VecDeque<Event>>,
    history_size: usize,
    queue_capacity: usize,
    next_event_id: AtomicU64,
    closed: AtomicBool,
}

impl NeuralBus {
    pub fn new(history_size: usize, queue_capacity: usize) -> Self {
        Self {
            subs: DashMap::new(),
            typed_index: DashMap::new(),
            wildcard: DashSet::new(),
            history: RwLock::new(VecDeque::with_capacity(history_size)),
            history_size,
            queue_capacity,
            next_event_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(1000, 100)
    }

    /// Subscribe to `selector` (empty string == wildcard). `handler` is
    /// invoked once per matching event, sequentially, in the publisher's
    /// FIFO order for this subscription.
    pub fn subscribe(&self, selector: &str, handler: Handler) -> CortexResult<SubscriptionId> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CortexError::Closed("bus"));
        }

        let record = SubscriptionRecord::spawn(selector.to_string(), handler, self.queue_capacity);
        let id = record.id;
        self.subs.insert(id, record);

        if selector.is_empty() {
            self.wildcard.insert(id);
        } else {
            self.typed_index
                .entry(selector.to_string())
                .or_insert_with(DashSet::new)
                .insert(id);
        }

        debug!(subscription = %id, selector, "bus: subscribed");
        Ok(id)
    }

    /// Append to history unconditionally, then fan out to every matching
    /// subscription via a non-blocking enqueue. Never blocks on a slow
    /// subscriber; a full queue drops the event for that subscription only.
    pub fn publish(&self, event: Event) -> CortexResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CortexError::Closed("bus"));
        }

        let id = self.next_event_id.fetch_add(1, Ordering::SeqCst);
        let event = event.stamped(id);

        {
            let mut history = self.history.write().unwrap();
            history.push_back(event.clone());
            while history.len() > self.history_size {
                history.pop_front();
            }
        }

        let type_str = event.event_type.as_str();
        if let Some(targets) = self.typed_index.get(type_str) {
            for sub_id in targets.iter() {
                if let Some(sub) = self.subs.get(&*sub_id) {
                    sub.try_deliver(event.clone());
                }
            }
        }
        for sub_id in self.wildcard.iter() {
            if let Some(sub) = self.subs.get(&*sub_id) {
                sub.try_deliver(event.clone());
            }
        }

        Ok(())
    }

    /// Remove a subscription, signal its drain to finish, and wait for
    /// in-flight/buffered deliveries to complete before returning.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> CortexResult<()> {
        let (_, record) = self
            .subs
            .remove(&id)
            .ok_or_else(|| CortexError::not_found(format!("subscription {id}")))?;

        self.wildcard.remove(&id);
        if let Some(set) = self.typed_index.get(&record.selector) {
            set.remove(&id);
        }
        self.typed_index.retain(|_, set| !set.is_empty());

        drop(record.tx);
        let _ = record.join.await;
        debug!(subscription = %id, "bus: unsubscribed");
        Ok(())
    }

    /// Signal every subscription, wait for drains, then refuse further
    /// Publish/Subscribe calls.
    pub async fn close(&self) -> CortexResult<()> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CortexError::Closed("bus"));
        }

        let ids: Vec<SubscriptionId> = self.subs.iter().map(|e| *e.key()).collect();
        let mut joins = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, record)) = self.subs.remove(&id) {
                drop(record.tx);
                joins.push(record.join);
            }
        }
        for join in joins {
            let _ = join.await;
        }

        self.typed_index.clear();
        self.wildcard.clear();
        info!("bus: closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn subscription_count(&self) -> usize {
        self.subs.len()
    }

    /// Count of events dropped for a specific subscription (per-subscription,
    /// not an error condition — see `errors` propagation policy).
    pub fn dropped_count(&self, id: SubscriptionId) -> Option<u64> {
        self.subs.get(&id).map(|r| r.dropped_count())
    }

    /// Sum of dropped counts across every live subscription, for ambient
    /// metrics export — drops are a metric, not an error.
    pub fn total_dropped(&self) -> u64 {
        self.subs.iter().map(|r| r.dropped_count()).sum()
    }

    /// Most recent `n` events (capped by the configured history size).
    pub fn history(&self, n: usize) -> Vec<Event> {
        let history = self.history.read().unwrap();
        let n = n.min(history.len());
        history.iter().rev().take(n).rev().cloned().collect()
    }

    pub fn history_all(&self) -> Vec<Event> {
        self.history(self.history_size)
    }
}

impl Default for NeuralBus {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::EventType;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn subscribe_then_unsubscribe_leaves_count_unchanged() {
        let bus = NeuralBus::with_defaults();
        let before = bus.subscription_count();
        let id = bus.subscribe("", Arc::new(|_| {})).unwrap();
        assert_eq!(bus.subscription_count(), before + 1);
        // unsubscribe is async; use a tiny runtime for this sync test.
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(bus.unsubscribe(id)).unwrap();
        assert_eq!(bus.subscription_count(), before);
    }

    #[tokio::test]
    async fn wildcard_receives_every_event_a_typed_subscription_would() {
        let bus = NeuralBus::with_defaults();
        let typed_count = Arc::new(AtomicUsize::new(0));
        let wild_count = Arc::new(AtomicUsize::new(0));
        let tc = Arc::clone(&typed_count);
        let wc = Arc::clone(&wild_count);
        bus.subscribe(EventType::Message.as_str(), Arc::new(move |_| {
            tc.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();
        bus.subscribe("", Arc::new(move |_| {
            wc.fetch_add(1, Ordering::Relaxed);
        }))
        .unwrap();

        bus.publish(Event::new(EventType::Message, "hi")).unwrap();
        bus.publish(Event::new(EventType::Heartbeat, "beat")).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(typed_count.load(Ordering::Relaxed), 1);
        assert_eq!(wild_count.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn publish_on_closed_bus_errors() {
        let bus = NeuralBus::with_defaults();
        bus.close().await.unwrap();
        let err = bus.publish(Event::new(EventType::Heartbeat, "x")).unwrap_err();
        assert_eq!(err, CortexError::Closed("bus"));
    }

    #[tokio::test]
    async fn double_close_reports_already_closed() {
        let bus = NeuralBus::with_defaults();
        bus.close().await.unwrap();
        assert!(bus.close().await.is_err());
    }

    #[tokio::test]
    async fn history_returns_most_recent_n() {
        let bus = NeuralBus::with_defaults();
        for i in 0..5 {
            bus.publish(Event::new(EventType::Heartbeat, format!("beat-{i}")))
                .unwrap();
        }
        let recent = bus.history(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "beat-2");
        assert_eq!(recent[2].content, "beat-4");
    }

    #[tokio::test]
    async fn history_ring_trims_to_configured_size() {
        let bus = NeuralBus::new(10, 100);
        for i in 0..50 {
            bus.publish(Event::new(EventType::Heartbeat, format!("{i}")))
                .unwrap();
        }
        assert_eq!(bus.history_all().len(), 10);
    }

    /// S1: 10 wildcard subscribers, 100 publishes — each subscriber's
    /// handled + dropped count must equal 100.
    #[tokio::test]
    async fn fan_out_conserves_handled_plus_dropped() {
        let bus = Arc::new(NeuralBus::new(1000, 100));
        let mut counters = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..10 {
            let counter = Arc::new(AtomicUsize::new(0));
            let c = Arc::clone(&counter);
            let id = bus
                .subscribe("", Arc::new(move |_| {
                    c.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap();
            counters.push(counter);
            ids.push(id);
        }

        for i in 0..100 {
            bus.publish(Event::new(EventType::Heartbeat, format!("{i}")))
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        for (counter, id) in counters.iter().zip(ids.iter()) {
            let handled = counter.load(Ordering::Relaxed) as u64;
            let dropped = bus.dropped_count(*id).unwrap();
            assert_eq!(handled + dropped, 100);
        }
    }

    #[tokio::test]
    async fn unsubscribe_unknown_id_is_not_found() {
        let bus = NeuralBus::with_defaults();
        let err = bus.unsubscribe(uuid::Uuid::new_v4()).await.unwrap_err();
        matches!(err, CortexError::NotFound(_));
    }
}
