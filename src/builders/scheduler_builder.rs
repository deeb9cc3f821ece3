//! Builders to construct a scheduler from configuration.

use std::sync::Arc;

use anyhow::anyhow;

use crate::config::SchedulerConfig;
use crate::core::{AppResult, EventSink, ResourceScheduler};
use crate::util::clock::Clock;

/// Build a [`ResourceScheduler`] from configuration, validating it first.
pub fn build_scheduler(
    cfg: &SchedulerConfig,
    clock: Arc<dyn Clock>,
    events: Option<Box<dyn EventSink>>,
) -> AppResult<ResourceScheduler> {
    cfg.validate().map_err(|e| anyhow!("config invalid: {e}"))?;
    let scheduler = ResourceScheduler::new(cfg.settings(), cfg.resource_catalog(), clock);
    Ok(match events {
        Some(sink) => scheduler.with_events(sink),
        None => scheduler,
    })
}
