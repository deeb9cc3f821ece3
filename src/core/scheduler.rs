//! The resource access scheduler aggregate.
//!
//! Owns all runtime state for every configured resource and exposes the
//! join/leave/accept/end operations plus the deadline-driven expiry sweep.
//! Each resource's state sits behind its own `parking_lot::Mutex`, so
//! operations on one resource are totally ordered while distinct resources
//! proceed concurrently. The resource map itself is immutable after
//! construction.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::events::{EventKind, EventSink, SchedulerEvent};
use crate::core::state::{Claim, Resource, ResourceSnapshot, ResourceState, Session, UserStatus};
use crate::core::SchedulerError;
use crate::core::UserIdentity;
use crate::util::clock::Clock;

/// Tunable scheduler timings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Grace window a claim holder has to start their session.
    pub claim_grace: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            claim_grace: Duration::from_secs(120),
        }
    }
}

/// Aggregate counters over all resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStats {
    /// Sessions currently running.
    pub active_sessions: usize,
    /// Wait entries across all queues.
    pub total_queued: usize,
    /// Claims currently outstanding.
    pub pending_claims: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineKind {
    Claim,
    Session,
}

/// One armed expiry instant. Entries are never removed on cancellation;
/// instead each carries the generation of the claim/session it was armed
/// for, and the sweep discards entries whose generation no longer matches
/// the live state.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Deadline {
    at_ms: u128,
    kind: DeadlineKind,
    resource_id: String,
    generation: u64,
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at_ms
            .cmp(&other.at_ms)
            .then(self.generation.cmp(&other.generation))
    }
}

/// Per-resource FIFO scheduler issuing expiring claims and time-boxed
/// sessions.
///
/// All mutating operations are synchronous and atomic from the caller's
/// point of view: either fully applied, or rejected with a
/// [`SchedulerError`] and zero state change.
pub struct ResourceScheduler {
    grace_ms: u128,
    clock: Arc<dyn Clock>,
    resources: HashMap<String, Mutex<ResourceState>>,
    /// Min-heap of armed expiry instants across all resources.
    deadlines: Mutex<BinaryHeap<Reverse<Deadline>>>,
    events: Option<Arc<Mutex<Box<dyn EventSink>>>>,
}

impl ResourceScheduler {
    /// Create a scheduler over a fixed set of resources.
    pub fn new(
        settings: SchedulerSettings,
        resources: Vec<Resource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resources = resources
            .into_iter()
            .map(|r| (r.id.clone(), Mutex::new(ResourceState::new(r))))
            .collect();
        Self {
            grace_ms: settings.claim_grace.as_millis(),
            clock,
            resources,
            deadlines: Mutex::new(BinaryHeap::new()),
            events: None,
        }
    }

    /// Attach an event sink.
    #[must_use]
    pub fn with_events(mut self, sink: Box<dyn EventSink>) -> Self {
        self.events = Some(Arc::new(Mutex::new(sink)));
        self
    }

    /// Ids of all configured resources, sorted.
    pub fn resource_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.resources.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether a resource id is configured.
    pub fn has_resource(&self, resource_id: &str) -> bool {
        self.resources.contains_key(resource_id)
    }

    /// Join a resource's waiting queue. Returns the assigned 1-based
    /// position. The first joiner of an idle resource receives an immediate
    /// claim.
    pub fn join(&self, resource_id: &str, user: &UserIdentity) -> Result<usize, SchedulerError> {
        let now = self.clock.now_ms();
        let state = self.state(resource_id)?;
        let mut events = Vec::with_capacity(2);
        let (position, granted) = {
            let mut guard = state.lock();
            let (position, granted) = guard.join(&user.id, &user.display_name, now, self.grace_ms)?;
            (position, granted)
        };
        tracing::info!(resource = resource_id, user = %user.id, position, "joined queue");
        events.push(SchedulerEvent::new(EventKind::Joined, resource_id, &user.id, now));
        if let Some(claim) = &granted {
            events.push(SchedulerEvent::new(
                EventKind::ClaimCreated,
                resource_id,
                &claim.user_id,
                now,
            ));
            self.arm_claim(resource_id, claim);
        }
        self.record(events);
        Ok(position)
    }

    /// Leave a resource's waiting queue. A claim held by the leaver is
    /// dropped and regranted to the new head; a running session is never
    /// affected.
    pub fn leave(&self, resource_id: &str, user: &UserIdentity) -> Result<(), SchedulerError> {
        let now = self.clock.now_ms();
        let state = self.state(resource_id)?;
        let regrant = {
            let mut guard = state.lock();
            guard.leave(&user.id, now, self.grace_ms)?
        };
        tracing::info!(resource = resource_id, user = %user.id, "left queue");
        let mut events = vec![SchedulerEvent::new(EventKind::Left, resource_id, &user.id, now)];
        if let Some(claim) = &regrant {
            events.push(SchedulerEvent::new(
                EventKind::ClaimCreated,
                resource_id,
                &claim.user_id,
                now,
            ));
            self.arm_claim(resource_id, claim);
        }
        self.record(events);
        Ok(())
    }

    /// Accept an outstanding claim and start a session of the resource's
    /// turn duration. The holder's wait entry is consumed.
    pub fn accept_claim(
        &self,
        resource_id: &str,
        user: &UserIdentity,
    ) -> Result<Session, SchedulerError> {
        let now = self.clock.now_ms();
        let state = self.state(resource_id)?;
        let session = {
            let mut guard = state.lock();
            guard.accept_claim(&user.id, now)?
        };
        tracing::info!(
            resource = resource_id,
            user = %user.id,
            expires_at_ms = %session.expires_at_ms,
            "session started"
        );
        self.arm_session(resource_id, &session);
        self.record(vec![
            SchedulerEvent::new(EventKind::ClaimAccepted, resource_id, &user.id, now),
            SchedulerEvent::new(EventKind::SessionStarted, resource_id, &user.id, now),
        ]);
        Ok(session)
    }

    /// End the caller's running session early, promoting the queue head to a
    /// fresh claim if anyone is waiting.
    pub fn end_session(
        &self,
        resource_id: &str,
        user: &UserIdentity,
    ) -> Result<(), SchedulerError> {
        let now = self.clock.now_ms();
        let state = self.state(resource_id)?;
        let regrant = {
            let mut guard = state.lock();
            guard.end_session(&user.id, now, self.grace_ms)?
        };
        tracing::info!(resource = resource_id, user = %user.id, "session ended early");
        let mut events = vec![SchedulerEvent::new(
            EventKind::SessionEnded,
            resource_id,
            &user.id,
            now,
        )];
        if let Some(claim) = &regrant {
            events.push(SchedulerEvent::new(
                EventKind::ClaimCreated,
                resource_id,
                &claim.user_id,
                now,
            ));
            self.arm_claim(resource_id, claim);
        }
        self.record(events);
        Ok(())
    }

    /// Run the expiry sweep for every deadline at or before `now_ms`.
    ///
    /// Idempotent: a second call with the same `now_ms` is a no-op, and a
    /// `now_ms` earlier than every armed deadline does nothing. Stale
    /// entries (whose claim/session was consumed before the deadline fired)
    /// are discarded here, which is what cancels a voided timer.
    pub fn advance(&self, now_ms: u128) {
        loop {
            let due = {
                let mut heap = self.deadlines.lock();
                match heap.peek() {
                    Some(Reverse(d)) if d.at_ms <= now_ms => heap.pop().map(|r| r.0),
                    _ => None,
                }
            };
            let Some(deadline) = due else { break };
            let Ok(state) = self.state(&deadline.resource_id) else {
                continue;
            };
            match deadline.kind {
                DeadlineKind::Claim => {
                    let outcome = {
                        let mut guard = state.lock();
                        guard.expire_claim(deadline.generation, now_ms, self.grace_ms)
                    };
                    if let Some((expired, replacement)) = outcome {
                        tracing::warn!(
                            resource = %deadline.resource_id,
                            user = %expired.user_id,
                            "claim expired, slot forfeited"
                        );
                        let mut events = vec![SchedulerEvent::new(
                            EventKind::ClaimExpired,
                            &deadline.resource_id,
                            &expired.user_id,
                            now_ms,
                        )];
                        if let Some(claim) = &replacement {
                            events.push(SchedulerEvent::new(
                                EventKind::ClaimCreated,
                                &deadline.resource_id,
                                &claim.user_id,
                                now_ms,
                            ));
                            self.arm_claim(&deadline.resource_id, claim);
                        }
                        self.record(events);
                    } else {
                        tracing::debug!(
                            resource = %deadline.resource_id,
                            "stale claim deadline discarded"
                        );
                    }
                }
                DeadlineKind::Session => {
                    let outcome = {
                        let mut guard = state.lock();
                        guard.expire_session(deadline.generation, now_ms, self.grace_ms)
                    };
                    if let Some((expired, replacement)) = outcome {
                        tracing::warn!(
                            resource = %deadline.resource_id,
                            user = %expired.user_id,
                            "session time box elapsed"
                        );
                        let mut events = vec![SchedulerEvent::new(
                            EventKind::SessionExpired,
                            &deadline.resource_id,
                            &expired.user_id,
                            now_ms,
                        )];
                        if let Some(claim) = &replacement {
                            events.push(SchedulerEvent::new(
                                EventKind::ClaimCreated,
                                &deadline.resource_id,
                                &claim.user_id,
                                now_ms,
                            ));
                            self.arm_claim(&deadline.resource_id, claim);
                        }
                        self.record(events);
                    } else {
                        tracing::debug!(
                            resource = %deadline.resource_id,
                            "stale session deadline discarded"
                        );
                    }
                }
            }
        }
    }

    /// Run the expiry sweep at the scheduler clock's current instant.
    pub fn advance_now(&self) {
        self.advance(self.clock.now_ms());
    }

    /// Current instant of the injected scheduler clock.
    pub fn now_ms(&self) -> u128 {
        self.clock.now_ms()
    }

    /// Nearest armed deadline, if any.
    ///
    /// May report a stale (already cancelled) instant; waking then is
    /// harmless because [`Self::advance`] discards the stale entry, and each
    /// armed entry causes at most one spurious wake.
    pub fn next_deadline_ms(&self) -> Option<u128> {
        self.deadlines.lock().peek().map(|Reverse(d)| d.at_ms)
    }

    /// A user's relationship to one resource. Pure read, no side effects.
    pub fn status(&self, resource_id: &str, user_id: &str) -> Result<UserStatus, SchedulerError> {
        Ok(self.state(resource_id)?.lock().status(user_id))
    }

    /// Read-only view of one resource's full state.
    pub fn snapshot(&self, resource_id: &str) -> Result<ResourceSnapshot, SchedulerError> {
        Ok(self.state(resource_id)?.lock().snapshot())
    }

    /// Snapshots of every resource, sorted by resource id.
    pub fn snapshot_all(&self) -> Vec<ResourceSnapshot> {
        let mut snapshots: Vec<_> = self
            .resources
            .values()
            .map(|state| state.lock().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.resource.id.cmp(&b.resource.id));
        snapshots
    }

    /// Aggregate counters over all resources.
    pub fn stats(&self) -> SchedulerStats {
        let mut stats = SchedulerStats {
            active_sessions: 0,
            total_queued: 0,
            pending_claims: 0,
        };
        for state in self.resources.values() {
            let guard = state.lock();
            stats.active_sessions += usize::from(guard.session().is_some());
            stats.pending_claims += usize::from(guard.claim().is_some());
            stats.total_queued += guard.queue_len();
        }
        stats
    }

    fn state(&self, resource_id: &str) -> Result<&Mutex<ResourceState>, SchedulerError> {
        self.resources
            .get(resource_id)
            .ok_or_else(|| SchedulerError::UnknownResource(resource_id.to_owned()))
    }

    fn arm_claim(&self, resource_id: &str, claim: &Claim) {
        self.arm(Deadline {
            at_ms: claim.expires_at_ms,
            kind: DeadlineKind::Claim,
            resource_id: resource_id.to_owned(),
            generation: claim.generation,
        });
    }

    fn arm_session(&self, resource_id: &str, session: &Session) {
        self.arm(Deadline {
            at_ms: session.expires_at_ms,
            kind: DeadlineKind::Session,
            resource_id: resource_id.to_owned(),
            generation: session.generation,
        });
    }

    fn arm(&self, deadline: Deadline) {
        self.deadlines.lock().push(Reverse(deadline));
    }

    fn record(&self, events: Vec<SchedulerEvent>) {
        if let Some(sink) = &self.events {
            let mut sink = sink.lock();
            for event in events {
                sink.record(event);
            }
        }
    }
}
