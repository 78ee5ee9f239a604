// Subscription lifecycle (C1).
//
// Each subscription owns a bounded mpsc queue (capacity `BusConfig::
// queue_capacity`); `Publish` enqueues with `try_send` so a slow
// subscriber never blocks the publisher — a full queue drops the event
// for that subscription only, counted in `dropped`. At most one task
// drains a subscription's queue, so its handler is never invoked
// concurrently with itself.

use super::event::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub type SubscriptionId = Uuid;
pub type Handler = Arc<dyn Fn(Event) + Send + Sync + 'static>;

pub(crate) struct SubscriptionRecord {
    pub id: SubscriptionId,
    /// Empty string == wildcard (matches every event type).
    pub selector: String,
    pub tx: mpsc::Sender<Event>,
    pub dropped: Arc<AtomicU64>,
    pub join: JoinHandle<()>,
}

impl SubscriptionRecord {
    pub fn spawn(selector: String, handler: Handler, queue_capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Event>(queue_capacity.max(1));
        let id = Uuid::new_v4();
        let dropped = Arc::new(AtomicU64::new(0));

        // Draining ends naturally once every `tx` clone (held only by the
        // bus's index) is dropped and the channel's buffer is exhausted —
        // no separate cancellation signal is needed to guarantee drain.
        let join = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handler(event);
            }
        });

        Self {
            id,
            selector,
            tx,
            dropped,
            join,
        }
    }

    /// Non-blocking enqueue. Returns `true` if delivered, `false` if the
    /// subscriber's queue was full (counted, not reported).
    pub fn try_deliver(&self, event: Event) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn matches(&self, event_type: &str) -> bool {
        self.selector.is_empty() || self.selector == event_type
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::EventType;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn wildcard_matches_every_type() {
        let rec = SubscriptionRecord::spawn(String::new(), Arc::new(|_| {}), 10);
        assert!(rec.matches(EventType::Message.as_str()));
        assert!(rec.matches(EventType::Heartbeat.as_str()));
    }

    #[tokio::test]
    async fn typed_selector_matches_only_its_type() {
        let rec =
            SubscriptionRecord::spawn(EventType::Message.as_str().to_string(), Arc::new(|_| {}), 10);
        assert!(rec.matches(EventType::Message.as_str()));
        assert!(!rec.matches(EventType::Heartbeat.as_str()));
    }

    #[tokio::test]
    async fn full_queue_drops_and_counts() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        // Capacity 1, handler never runs (we don't await the task) so the
        // second try_send observes a full queue.
        let rec = SubscriptionRecord::spawn(
            String::new(),
            Arc::new(move |_| {
                c.fetch_add(1, Ordering::Relaxed);
            }),
            1,
        );
        let e = Event::new(EventType::Message, "one");
        assert!(rec.try_deliver(e.clone()));
        // Give the drain task no chance to run by immediately sending more
        // than capacity synchronously; try_send is synchronous so this is
        // a tight race in practice, so we just assert no panic and a
        // sane dropped_count afterward once we flood it.
        for _ in 0..1000 {
            rec.try_deliver(Event::new(EventType::Message, "flood"));
        }
        // Either delivered (handler incremented counter) or dropped
        // (counted) — every attempt must land in exactly one bucket.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let delivered = counter.load(Ordering::Relaxed) as u64;
        assert_eq!(delivered + rec.dropped_count(), 1001);
    }
}
