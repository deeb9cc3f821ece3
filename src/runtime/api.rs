//! API-facing request/response models.
//!
//! Thin facade over the scheduler: each mutating call resolves the caller's
//! credential through the [`IdentityProvider`] first, so the scheduler only
//! ever sees stable identities.

use serde::{Deserialize, Serialize};

use crate::core::{
    Credential, IdentityProvider, ResourceScheduler, ResourceSnapshot, Role, SchedulerError,
    SchedulerStats, Session, UserStatus,
};
use crate::util::tag::decode_tag;

/// Request naming a resource and carrying the caller's credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// Caller credential; resolved, never stored.
    pub credential: Credential,
    /// Target resource id.
    pub resource_id: String,
}

/// Successful join outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    /// Resource joined.
    pub resource_id: String,
    /// Assigned 1-based queue position.
    pub position: usize,
}

/// A user's status on one resource.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Resource queried.
    pub resource_id: String,
    /// Resolved user id.
    pub user_id: String,
    /// Derived status.
    pub status: UserStatus,
}

/// Aggregate view for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    /// Counters over all resources.
    pub stats: SchedulerStats,
    /// Per-resource snapshots, sorted by id.
    pub resources: Vec<ResourceSnapshot>,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Join a resource's queue.
pub async fn join(
    scheduler: &ResourceScheduler,
    identity: &dyn IdentityProvider,
    req: &ResourceRequest,
) -> Result<JoinResponse, SchedulerError> {
    let user = identity.resolve(&req.credential).await?;
    let position = scheduler.join(&req.resource_id, &user)?;
    Ok(JoinResponse {
        resource_id: req.resource_id.clone(),
        position,
    })
}

/// Leave a resource's queue.
pub async fn leave(
    scheduler: &ResourceScheduler,
    identity: &dyn IdentityProvider,
    req: &ResourceRequest,
) -> Result<(), SchedulerError> {
    let user = identity.resolve(&req.credential).await?;
    scheduler.leave(&req.resource_id, &user)
}

/// Accept the caller's outstanding claim, starting their session.
pub async fn accept_claim(
    scheduler: &ResourceScheduler,
    identity: &dyn IdentityProvider,
    req: &ResourceRequest,
) -> Result<Session, SchedulerError> {
    let user = identity.resolve(&req.credential).await?;
    scheduler.accept_claim(&req.resource_id, &user)
}

/// End the caller's running session early.
pub async fn end_session(
    scheduler: &ResourceScheduler,
    identity: &dyn IdentityProvider,
    req: &ResourceRequest,
) -> Result<(), SchedulerError> {
    let user = identity.resolve(&req.credential).await?;
    scheduler.end_session(&req.resource_id, &user)
}

/// Query the caller's status on a resource.
pub async fn status(
    scheduler: &ResourceScheduler,
    identity: &dyn IdentityProvider,
    req: &ResourceRequest,
) -> Result<StatusResponse, SchedulerError> {
    let user = identity.resolve(&req.credential).await?;
    let status = scheduler.status(&req.resource_id, &user.id)?;
    Ok(StatusResponse {
        resource_id: req.resource_id.clone(),
        user_id: user.id,
        status,
    })
}

/// Resolve scanned tag text to a configured resource id.
pub fn scan_tag(scheduler: &ResourceScheduler, text: &str) -> Result<String, SchedulerError> {
    let id = decode_tag(text)
        .ok_or_else(|| SchedulerError::UnknownResource(text.trim().to_owned()))?;
    if scheduler.has_resource(id) {
        Ok(id.to_owned())
    } else {
        Err(SchedulerError::UnknownResource(id.to_owned()))
    }
}

/// Aggregate dashboard view; admin accounts only.
pub async fn admin_overview(
    scheduler: &ResourceScheduler,
    identity: &dyn IdentityProvider,
    credential: &Credential,
) -> Result<AdminOverview, SchedulerError> {
    let user = identity.resolve(credential).await?;
    if user.role != Role::Admin {
        return Err(SchedulerError::Auth("admin role required".into()));
    }
    Ok(AdminOverview {
        stats: scheduler.stats(),
        resources: scheduler.snapshot_all(),
    })
}

/// Return a health payload.
pub const fn health() -> Health {
    Health { ok: true }
}
