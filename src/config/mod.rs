//! Configuration models for resources and scheduler timings.

pub mod resources;

pub use resources::{ResourceConfig, SchedulerConfig};
