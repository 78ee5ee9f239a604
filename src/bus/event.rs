// Event value type (C1) — immutable once published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Closed set of event type tags. `as_str()` is the canonical string form
/// used both for wire-free matching and for wildcard subscriptions (an
/// empty-string selector matches every type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Lifecycle,
    Phase,
    Pathway,
    Message,
    Heartbeat,
    LlmRequest,
    LlmResponse,
    LlmError,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Lifecycle => "lifecycle",
            EventType::Phase => "phase",
            EventType::Pathway => "pathway",
            EventType::Message => "message",
            EventType::Heartbeat => "heartbeat",
            EventType::LlmRequest => "llm_request",
            EventType::LlmResponse => "llm_response",
            EventType::LlmError => "llm_error",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published event. Value-typed and immutable after construction —
/// fields are `pub` for ergonomic construction but nothing mutates an
/// `Event` once it has been handed to `Bus::publish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub request_id: Option<Uuid>,
    pub lobe_id: Option<String>,
    pub state: Option<String>,
    pub phase: Option<String>,
    pub confidence: f64,
    pub duration: Option<Duration>,
    pub content: String,
    pub details: Option<String>,
    /// Ordered sequence of lobe ids the request activated, oldest first.
    pub pathway: Vec<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    /// Opaque key-value snapshot of a blackboard update, when relevant.
    pub blackboard_snapshot: Option<HashMap<String, String>>,
}

impl Event {
    /// Construct a minimal event of the given type; `id` and `timestamp`
    /// are filled in by the bus at publish time via [`Event::stamped`].
    pub fn new(event_type: EventType, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            event_type,
            request_id: None,
            lobe_id: None,
            state: None,
            phase: None,
            confidence: 0.0,
            duration: None,
            content: content.into(),
            details: None,
            pathway: Vec::new(),
            source: None,
            target: None,
            blackboard_snapshot: None,
        }
    }

    pub fn with_request_id(mut self, id: Uuid) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn with_lobe(mut self, lobe_id: impl Into<String>) -> Self {
        self.lobe_id = Some(lobe_id.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_pathway(mut self, pathway: Vec<String>) -> Self {
        self.pathway = pathway;
        self
    }

    /// Stamp a fresh id and timestamp — called once, inside the bus's
    /// publish critical section, so ids are monotonic per process.
    pub(crate) fn stamped(mut self, id: u64) -> Self {
        self.id = id;
        self.timestamp = Utc::now();
        self
    }
}
