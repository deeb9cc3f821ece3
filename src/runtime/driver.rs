//! Tokio-based expiry driver.
//!
//! The scheduler itself never sleeps; this driver supplies the timing
//! trigger for [`ResourceScheduler::advance`]. It sleeps until the nearest
//! armed deadline, capped by a configurable interval so deadlines armed
//! while it sleeps are still observed promptly. The cap must stay materially
//! below the claim grace and every turn duration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::core::ResourceScheduler;

/// Handle to stop a running [`ExpiryDriver`].
#[derive(Clone)]
pub struct DriverHandle {
    shutdown: Arc<Notify>,
}

impl DriverHandle {
    /// Ask the driver to exit after its current iteration.
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

/// Deadline-driven sweep loop for one scheduler.
pub struct ExpiryDriver {
    scheduler: Arc<ResourceScheduler>,
    max_interval: Duration,
    shutdown: Arc<Notify>,
}

impl ExpiryDriver {
    /// Create a driver over `scheduler` with the given sleep cap.
    pub fn new(scheduler: Arc<ResourceScheduler>, max_interval: Duration) -> Self {
        Self {
            scheduler,
            max_interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle for stopping the driver once it runs.
    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Run the sweep loop until shut down.
    pub async fn run(self) {
        let cap_ms = self.max_interval.as_millis().max(1);
        loop {
            let now = self.scheduler.now_ms();
            let sleep_ms = self
                .scheduler
                .next_deadline_ms()
                .map_or(cap_ms, |at| at.saturating_sub(now).min(cap_ms));
            let sleep = Duration::from_millis(u64::try_from(sleep_ms).unwrap_or(u64::MAX));
            tokio::select! {
                () = tokio::time::sleep(sleep) => {
                    self.scheduler.advance_now();
                }
                () = self.shutdown.notified() => {
                    tracing::info!("expiry driver shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn the sweep loop on the current tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
