//! Scheduler event sink implementations.
//!
//! Every state transition emits an event so observers (UI push channels,
//! logging, metrics) can subscribe read-only without touching scheduler
//! state.

use std::collections::VecDeque;

use serde::Serialize;
use uuid::Uuid;

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A user joined the waiting queue.
    Joined,
    /// A user left the waiting queue.
    Left,
    /// A claim was granted to the queue head.
    ClaimCreated,
    /// The claim holder accepted their turn.
    ClaimAccepted,
    /// A claim ran out its grace window; the holder forfeited their slot.
    ClaimExpired,
    /// A session began.
    SessionStarted,
    /// The session holder ended their turn early.
    SessionEnded,
    /// A session ran out its time box.
    SessionExpired,
}

/// One scheduler event.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// What happened.
    pub kind: EventKind,
    /// Resource the event concerns.
    pub resource_id: String,
    /// User the event concerns.
    pub user_id: String,
    /// When it happened, milliseconds since epoch (scheduler clock).
    pub at_ms: u128,
}

impl SchedulerEvent {
    /// Build an event stamped with a fresh id.
    pub fn new(kind: EventKind, resource_id: &str, user_id: &str, at_ms: u128) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            resource_id: resource_id.to_owned(),
            user_id: user_id.to_owned(),
            at_ms,
        }
    }
}

/// Event sink abstraction.
pub trait EventSink: Send {
    /// Record a scheduler event.
    fn record(&mut self, event: SchedulerEvent);
}

/// In-memory event sink for testing and dev.
pub struct InMemoryEventSink {
    events: VecDeque<SchedulerEvent>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.events.iter().cloned().collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&mut self, event: SchedulerEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that forwards events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&mut self, event: SchedulerEvent) {
        tracing::info!(
            resource = %event.resource_id,
            user = %event.user_id,
            at_ms = %event.at_ms,
            "{:?}",
            event.kind
        );
    }
}
