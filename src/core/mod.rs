//! Core scheduling state machine, identity seam, and event sinks.

pub mod error;
pub mod events;
pub mod identity;
pub mod scheduler;
pub mod state;

pub use error::{AppResult, SchedulerError};
pub use events::{EventKind, EventSink, InMemoryEventSink, SchedulerEvent, TracingEventSink};
pub use identity::{Credential, IdentityProvider, InMemoryIdentityProvider, Role, UserIdentity};
pub use scheduler::{ResourceScheduler, SchedulerSettings, SchedulerStats};
pub use state::{
    Claim, Resource, ResourceSnapshot, ResourceState, Session, UserStatus, WaitEntry,
};
