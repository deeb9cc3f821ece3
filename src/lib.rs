//! # GymQueue
//!
//! A fair-access scheduler for shared exclusive-use equipment.
//!
//! This library provides the scheduling core behind a queue-for-equipment
//! system: many users share a small set of resources (gym machines), each
//! usable by one person at a time. Waiters queue FIFO per resource; when a
//! resource frees up, the queue head receives a time-boxed *claim* — a grace
//! window to actually walk over and start — which they convert into a
//! time-boxed *session*. Claims and sessions that run out are expired
//! automatically and the next waiter is promoted.
//!
//! ## Core Model
//!
//! - **Resource**: one exclusively-usable unit, configured at startup.
//! - **Claim**: invitation for the queue head to begin, expiring after a
//!   grace window (120 s by default). Letting it lapse forfeits the slot.
//! - **Session**: exclusive use for the resource's turn duration.
//!
//! Per resource, at most one claim or session exists at any instant, a claim
//! always belongs to the queue head, and a session holder is never queued.
//! All timing flows through an injected [`util::clock::Clock`], so expiry
//! behavior is fully deterministic under test.
//!
//! ## Quick Tour
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gymqueue::builders::build_scheduler;
//! use gymqueue::config::SchedulerConfig;
//! use gymqueue::core::InMemoryEventSink;
//! use gymqueue::runtime::ExpiryDriver;
//! use gymqueue::util::clock::SystemClock;
//!
//! let cfg = SchedulerConfig::gym_default();
//! let scheduler = Arc::new(build_scheduler(
//!     &cfg,
//!     Arc::new(SystemClock),
//!     Some(Box::new(InMemoryEventSink::new(1024))),
//! )?);
//!
//! // Drive expiry on a tokio runtime (feature `tokio-runtime`).
//! let driver = ExpiryDriver::new(
//!     Arc::clone(&scheduler),
//!     std::time::Duration::from_millis(cfg.sweep_interval_ms),
//! );
//! let stopper = driver.handle();
//! driver.spawn();
//!
//! let position = scheduler.join("bench-press", &user)?;
//! let session = scheduler.accept_claim("bench-press", &user)?;
//! scheduler.end_session("bench-press", &user)?;
//! stopper.shutdown();
//! ```
//!
//! Identity resolution ([`core::IdentityProvider`]) and scannable resource
//! tags ([`util::tag`]) are narrow external seams; the scheduler never
//! stores credentials and never renders codes.
//!
//! For complete examples, see `tests/scheduler_flow_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling state machine, identity seam, and event sinks.
pub mod core;
/// Configuration models for resources and scheduler timings.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Runtime adapters: API surface and the tokio expiry driver.
pub mod runtime;
/// Shared utilities.
pub mod util;
