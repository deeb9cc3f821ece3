//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler operations.
///
/// All variants are caller-recoverable; a returned error guarantees the
/// scheduler state is unchanged.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No resource is configured under the given id.
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    /// The user is already waiting in this resource's queue.
    #[error("already queued")]
    AlreadyQueued,
    /// The user is not in this resource's queue.
    #[error("not queued")]
    NotQueued,
    /// No claim is outstanding for this resource.
    #[error("no claim")]
    NoClaim,
    /// A claim exists but belongs to a different user.
    #[error("claim not owned")]
    ClaimNotOwned,
    /// No session is running on this resource.
    #[error("no session")]
    NoSession,
    /// A session is running but belongs to a different user.
    #[error("session not owned")]
    SessionNotOwned,
    /// Credential resolution failed.
    #[error("auth error: {0}")]
    Auth(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
