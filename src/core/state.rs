//! Per-resource queue/claim/session state machine.
//!
//! A resource cycles `IDLE -> CLAIMED -> ACTIVE` and back. All transitions
//! run under the owning scheduler's per-resource lock; this module holds the
//! pure state logic and enforces the structural invariants:
//!
//! 1. At most one of {claim, session} exists at any instant.
//! 2. A claim always belongs to the queue head, and the head stays queued
//!    while claimed.
//! 3. A session holder is never in the queue.
//! 4. A user occupies at most one wait entry per resource.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

/// Static descriptor for one exclusively-usable resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier (also the tag payload).
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Length of one session in milliseconds.
    pub turn_ms: u128,
}

/// One user's position in a resource's waiting queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitEntry {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name captured at join time.
    pub display_name: String,
    /// Join timestamp in milliseconds since epoch.
    pub joined_at_ms: u128,
}

/// Time-boxed invitation for the queue head to begin a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Holder's user identifier (always the queue head).
    pub user_id: String,
    /// Holder's display name.
    pub display_name: String,
    /// Instant after which the claim is forfeited.
    pub expires_at_ms: u128,
    /// Identity token for deadline cancellation.
    #[serde(skip)]
    pub(crate) generation: u64,
}

/// Time-boxed exclusive use of a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Holder's user identifier.
    pub user_id: String,
    /// Holder's display name.
    pub display_name: String,
    /// Session start timestamp.
    pub started_at_ms: u128,
    /// Instant after which the session ends automatically.
    pub expires_at_ms: u128,
    /// Identity token for deadline cancellation.
    #[serde(skip)]
    pub(crate) generation: u64,
}

/// A user's relationship to one resource, derived from current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// The user holds the running session.
    Active,
    /// The user holds the outstanding claim.
    ClaimPending,
    /// The user waits in the queue at the given 1-based position.
    Queued(usize),
    /// The user has no relationship to the resource.
    Absent,
}

/// Read-only view of one resource's full state.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    /// Static descriptor.
    pub resource: Resource,
    /// Waiting queue in FIFO order.
    pub queue: Vec<WaitEntry>,
    /// Outstanding claim, if any.
    pub claim: Option<Claim>,
    /// Running session, if any.
    pub session: Option<Session>,
}

/// Mutable runtime state for one resource.
///
/// Owned exclusively by the scheduler; callers interact through
/// [`crate::core::ResourceScheduler`].
#[derive(Debug)]
pub struct ResourceState {
    resource: Resource,
    queue: VecDeque<WaitEntry>,
    claim: Option<Claim>,
    session: Option<Session>,
    /// Bumped for every claim/session created; stale deadline entries are
    /// detected by comparing against this.
    next_generation: u64,
}

impl ResourceState {
    /// Create empty state for a configured resource.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            queue: VecDeque::new(),
            claim: None,
            session: None,
            next_generation: 0,
        }
    }

    /// Static descriptor for this resource.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Current queue length.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Outstanding claim, if any.
    pub fn claim(&self) -> Option<&Claim> {
        self.claim.as_ref()
    }

    /// Running session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Append a wait entry for `user_id`, granting an immediate claim when
    /// the resource was idle. Returns the assigned 1-based position and the
    /// granted claim, if one was created.
    pub fn join(
        &mut self,
        user_id: &str,
        display_name: &str,
        now_ms: u128,
        grace_ms: u128,
    ) -> Result<(usize, Option<Claim>), SchedulerError> {
        if self.queue.iter().any(|e| e.user_id == user_id) {
            return Err(SchedulerError::AlreadyQueued);
        }
        // A session holder re-joining would put them in the queue while
        // active, breaking the holder-not-queued invariant.
        if self.session.as_ref().is_some_and(|s| s.user_id == user_id) {
            return Err(SchedulerError::AlreadyQueued);
        }
        self.queue.push_back(WaitEntry {
            user_id: user_id.to_owned(),
            display_name: display_name.to_owned(),
            joined_at_ms: now_ms,
        });
        let position = self.queue.len();
        let granted = if position == 1 && self.claim.is_none() && self.session.is_none() {
            self.grant_claim(now_ms, grace_ms)
        } else {
            None
        };
        Ok((position, granted))
    }

    /// Remove `user_id` from the queue. If the leaver was head and held the
    /// claim, the claim is dropped and regranted to the new head; the
    /// regranted claim (if any) is returned. A running session is never
    /// affected.
    pub fn leave(
        &mut self,
        user_id: &str,
        now_ms: u128,
        grace_ms: u128,
    ) -> Result<Option<Claim>, SchedulerError> {
        let Some(idx) = self.queue.iter().position(|e| e.user_id == user_id) else {
            return Err(SchedulerError::NotQueued);
        };
        let held_claim =
            idx == 0 && self.claim.as_ref().is_some_and(|c| c.user_id == user_id);
        self.queue.remove(idx);
        if held_claim {
            self.claim = None;
            return Ok(self.grant_claim(now_ms, grace_ms));
        }
        Ok(None)
    }

    /// Convert the outstanding claim into a session.
    ///
    /// A claim whose deadline has already passed is treated as absent: the
    /// expiry sweep is the sole authority that deletes expired claims, so the
    /// claim itself is left in place and the call fails with `NoClaim`.
    pub fn accept_claim(
        &mut self,
        user_id: &str,
        now_ms: u128,
    ) -> Result<Session, SchedulerError> {
        let claim = self.claim.as_ref().ok_or(SchedulerError::NoClaim)?;
        if now_ms >= claim.expires_at_ms {
            return Err(SchedulerError::NoClaim);
        }
        if claim.user_id != user_id {
            return Err(SchedulerError::ClaimNotOwned);
        }
        let claim = self.claim.take().ok_or(SchedulerError::NoClaim)?;
        // Invariant 2: the claim holder is the queue head.
        debug_assert_eq!(
            self.queue.front().map(|e| e.user_id.as_str()),
            Some(user_id)
        );
        self.queue.retain(|e| e.user_id != user_id);
        let session = Session {
            user_id: claim.user_id,
            display_name: claim.display_name,
            started_at_ms: now_ms,
            expires_at_ms: now_ms + self.resource.turn_ms,
            generation: self.bump_generation(),
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    /// End the running session early. Returns the claim granted to the new
    /// queue head, if the queue is non-empty.
    pub fn end_session(
        &mut self,
        user_id: &str,
        now_ms: u128,
        grace_ms: u128,
    ) -> Result<Option<Claim>, SchedulerError> {
        let session = self.session.as_ref().ok_or(SchedulerError::NoSession)?;
        if session.user_id != user_id {
            return Err(SchedulerError::SessionNotOwned);
        }
        self.session = None;
        Ok(self.grant_claim(now_ms, grace_ms))
    }

    /// Expire the claim identified by `generation` if it is still live and
    /// past its deadline. The forfeiting head entry is removed from the
    /// queue. Returns the expired claim and the replacement granted to the
    /// next head, if any.
    pub fn expire_claim(
        &mut self,
        generation: u64,
        now_ms: u128,
        grace_ms: u128,
    ) -> Option<(Claim, Option<Claim>)> {
        let live = self
            .claim
            .as_ref()
            .is_some_and(|c| c.generation == generation && now_ms >= c.expires_at_ms);
        if !live {
            return None;
        }
        let expired = self.claim.take()?;
        // The holder forfeits their slot; this is the only transition that
        // evicts a queue member without their consent.
        self.queue.retain(|e| e.user_id != expired.user_id);
        let replacement = self.grant_claim(now_ms, grace_ms);
        Some((expired, replacement))
    }

    /// Expire the session identified by `generation` if it is still live and
    /// past its deadline. The queue head (if any) receives a fresh claim and
    /// stays queued, exactly as on a voluntary `end_session`.
    pub fn expire_session(
        &mut self,
        generation: u64,
        now_ms: u128,
        grace_ms: u128,
    ) -> Option<(Session, Option<Claim>)> {
        let live = self
            .session
            .as_ref()
            .is_some_and(|s| s.generation == generation && now_ms >= s.expires_at_ms);
        if !live {
            return None;
        }
        let expired = self.session.take()?;
        let replacement = self.grant_claim(now_ms, grace_ms);
        Some((expired, replacement))
    }

    /// Derive a user's relationship to this resource.
    pub fn status(&self, user_id: &str) -> UserStatus {
        if self.session.as_ref().is_some_and(|s| s.user_id == user_id) {
            return UserStatus::Active;
        }
        if self.claim.as_ref().is_some_and(|c| c.user_id == user_id) {
            return UserStatus::ClaimPending;
        }
        match self.queue.iter().position(|e| e.user_id == user_id) {
            Some(idx) => UserStatus::Queued(idx + 1),
            None => UserStatus::Absent,
        }
    }

    /// Clone the full state into a read-only snapshot.
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            resource: self.resource.clone(),
            queue: self.queue.iter().cloned().collect(),
            claim: self.claim.clone(),
            session: self.session.clone(),
        }
    }

    /// Nearest live deadline for this resource, if any.
    pub fn next_deadline_ms(&self) -> Option<u128> {
        match (&self.claim, &self.session) {
            (Some(c), None) => Some(c.expires_at_ms),
            (None, Some(s)) => Some(s.expires_at_ms),
            (None, None) => None,
            // Invariant 1 forbids claim and session coexisting.
            (Some(_), Some(_)) => unreachable!("claim and session coexist"),
        }
    }

    fn grant_claim(&mut self, now_ms: u128, grace_ms: u128) -> Option<Claim> {
        debug_assert!(self.claim.is_none() && self.session.is_none());
        let head = self.queue.front()?;
        let claim = Claim {
            user_id: head.user_id.clone(),
            display_name: head.display_name.clone(),
            expires_at_ms: now_ms + grace_ms,
            generation: self.bump_generation(),
        };
        self.claim = Some(claim.clone());
        Some(claim)
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: u128 = 120_000;

    fn state(turn_ms: u128) -> ResourceState {
        ResourceState::new(Resource {
            id: "bench-press".into(),
            display_name: "Bench Press".into(),
            turn_ms,
        })
    }

    #[test]
    fn first_join_on_idle_resource_grants_claim() {
        let mut st = state(600_000);
        let (pos, claim) = st.join("alice", "Alice", 1_000, GRACE).unwrap();
        assert_eq!(pos, 1);
        let claim = claim.expect("head should receive an immediate claim");
        assert_eq!(claim.user_id, "alice");
        assert_eq!(claim.expires_at_ms, 1_000 + GRACE);
        // Invariant 2: holder stays queued while claimed.
        assert_eq!(st.queue_len(), 1);
    }

    #[test]
    fn second_join_does_not_disturb_claim() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        let (pos, claim) = st.join("bob", "Bob", 2_000, GRACE).unwrap();
        assert_eq!(pos, 2);
        assert!(claim.is_none());
        assert_eq!(st.claim().unwrap().user_id, "alice");
    }

    #[test]
    fn duplicate_join_is_rejected_without_change() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        let err = st.join("alice", "Alice", 2_000, GRACE).unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyQueued));
        assert_eq!(st.queue_len(), 1);
    }

    #[test]
    fn accept_converts_claim_and_removes_head() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.join("bob", "Bob", 2_000, GRACE).unwrap();
        let session = st.accept_claim("alice", 5_000).unwrap();
        assert_eq!(session.user_id, "alice");
        assert_eq!(session.expires_at_ms, 5_000 + 600_000);
        assert!(st.claim().is_none());
        // Invariant 3: session holder left the queue; bob is now head.
        assert_eq!(st.queue_len(), 1);
        assert_eq!(st.status("alice"), UserStatus::Active);
        assert_eq!(st.status("bob"), UserStatus::Queued(1));
    }

    #[test]
    fn accept_after_deadline_reports_no_claim_and_keeps_state() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        let at = 1_000 + GRACE;
        let err = st.accept_claim("alice", at).unwrap_err();
        assert!(matches!(err, SchedulerError::NoClaim));
        // The sweep, not the caller, deletes the expired claim.
        assert!(st.claim().is_some());
        assert_eq!(st.queue_len(), 1);
    }

    #[test]
    fn accept_by_non_holder_is_rejected() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.join("bob", "Bob", 2_000, GRACE).unwrap();
        let err = st.accept_claim("bob", 5_000).unwrap_err();
        assert!(matches!(err, SchedulerError::ClaimNotOwned));
        assert_eq!(st.claim().unwrap().user_id, "alice");
    }

    #[test]
    fn leave_of_claim_holder_regrants_to_next_head() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.join("bob", "Bob", 2_000, GRACE).unwrap();
        st.join("carol", "Carol", 3_000, GRACE).unwrap();
        let regrant = st.leave("alice", 10_000, GRACE).unwrap();
        let regrant = regrant.expect("bob should inherit a fresh claim");
        assert_eq!(regrant.user_id, "bob");
        assert_eq!(regrant.expires_at_ms, 10_000 + GRACE);
        assert_eq!(st.status("carol"), UserStatus::Queued(2));
    }

    #[test]
    fn leave_of_middle_entry_changes_nothing_else() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.join("bob", "Bob", 2_000, GRACE).unwrap();
        st.join("carol", "Carol", 3_000, GRACE).unwrap();
        let regrant = st.leave("bob", 10_000, GRACE).unwrap();
        assert!(regrant.is_none());
        assert_eq!(st.claim().unwrap().user_id, "alice");
        assert_eq!(st.claim().unwrap().expires_at_ms, 1_000 + GRACE);
        assert_eq!(st.status("carol"), UserStatus::Queued(2));
    }

    #[test]
    fn leave_never_touches_a_session() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.accept_claim("alice", 2_000).unwrap();
        let err = st.leave("alice", 4_000, GRACE).unwrap_err();
        assert!(matches!(err, SchedulerError::NotQueued));
        assert!(st.session().is_some());
        assert_eq!(st.status("alice"), UserStatus::Active);
    }

    #[test]
    fn session_holder_cannot_rejoin_the_queue() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.accept_claim("alice", 2_000).unwrap();
        let err = st.join("alice", "Alice", 3_000, GRACE).unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyQueued));
        assert_eq!(st.queue_len(), 0);
    }

    #[test]
    fn claim_expiry_evicts_head_and_promotes_next() {
        let mut st = state(600_000);
        let (_, claim) = st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.join("bob", "Bob", 2_000, GRACE).unwrap();
        let generation = claim.unwrap().generation;
        let at = 1_000 + GRACE;
        let (expired, replacement) = st.expire_claim(generation, at, GRACE).unwrap();
        assert_eq!(expired.user_id, "alice");
        let replacement = replacement.unwrap();
        assert_eq!(replacement.user_id, "bob");
        assert_eq!(replacement.expires_at_ms, at + GRACE);
        assert_eq!(st.status("alice"), UserStatus::Absent);
        assert_eq!(st.queue_len(), 1);
    }

    #[test]
    fn stale_generation_does_not_expire() {
        let mut st = state(600_000);
        let (_, claim) = st.join("alice", "Alice", 1_000, GRACE).unwrap();
        let generation = claim.unwrap().generation;
        st.accept_claim("alice", 2_000).unwrap();
        // The claim deadline fires after acceptance already consumed it.
        assert!(st.expire_claim(generation, 1_000 + GRACE, GRACE).is_none());
        assert!(st.session().is_some());
    }

    #[test]
    fn session_expiry_promotes_head_without_evicting() {
        let mut st = state(10_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        let session = st.accept_claim("alice", 2_000).unwrap();
        st.join("bob", "Bob", 3_000, GRACE).unwrap();
        let (expired, claim) = st
            .expire_session(session.generation, session.expires_at_ms, GRACE)
            .unwrap();
        assert_eq!(expired.user_id, "alice");
        assert_eq!(claim.unwrap().user_id, "bob");
        // Bob stays queued while holding the claim.
        assert_eq!(st.status("bob"), UserStatus::ClaimPending);
        assert_eq!(st.queue_len(), 1);
    }

    #[test]
    fn end_session_with_empty_queue_returns_to_idle() {
        let mut st = state(600_000);
        st.join("alice", "Alice", 1_000, GRACE).unwrap();
        st.accept_claim("alice", 2_000).unwrap();
        let claim = st.end_session("alice", 3_000, GRACE).unwrap();
        assert!(claim.is_none());
        assert!(st.session().is_none());
        assert!(st.claim().is_none());
        assert_eq!(st.next_deadline_ms(), None);
    }
}
