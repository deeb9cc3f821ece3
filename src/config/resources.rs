//! Scheduler and resource configuration structures.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::core::{Resource, SchedulerSettings};

const fn default_claim_grace_secs() -> u64 {
    120
}

const fn default_sweep_interval_ms() -> u64 {
    500
}

/// One configured resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Unique resource identifier (also the tag payload).
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Length of one session in seconds.
    pub turn_secs: u64,
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Grace window for starting a claimed turn, in seconds.
    #[serde(default = "default_claim_grace_secs")]
    pub claim_grace_secs: u64,
    /// Upper bound on the expiry driver's sleep, in milliseconds. Must stay
    /// materially below the claim grace and every turn duration.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// The resource catalog.
    pub resources: Vec<ResourceConfig>,
}

impl ResourceConfig {
    /// Validate one resource entry.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("resource id must be non-empty".into());
        }
        if self.display_name.trim().is_empty() {
            return Err("display_name must be non-empty".into());
        }
        if self.turn_secs == 0 {
            return Err("turn_secs must be greater than 0".into());
        }
        Ok(())
    }
}

impl SchedulerConfig {
    /// Validate all resources and the scheduler timings.
    pub fn validate(&self) -> Result<(), String> {
        if self.claim_grace_secs == 0 {
            return Err("claim_grace_secs must be greater than 0".into());
        }
        if self.sweep_interval_ms == 0 {
            return Err("sweep_interval_ms must be greater than 0".into());
        }
        if self.sweep_interval_ms >= self.claim_grace_secs * 1000 {
            return Err("sweep_interval_ms must be smaller than the claim grace".into());
        }
        if self.resources.is_empty() {
            return Err("at least one resource must be defined".into());
        }
        let mut seen = HashSet::new();
        for resource in &self.resources {
            resource
                .validate()
                .map_err(|e| format!("resource `{}` invalid: {e}", resource.id))?;
            if !seen.insert(resource.id.as_str()) {
                return Err(format!("duplicate resource id `{}`", resource.id));
            }
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Scheduler timing settings derived from this config.
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            claim_grace: Duration::from_secs(self.claim_grace_secs),
        }
    }

    /// Static resource descriptors derived from this config.
    pub fn resource_catalog(&self) -> Vec<Resource> {
        self.resources
            .iter()
            .map(|r| Resource {
                id: r.id.clone(),
                display_name: r.display_name.clone(),
                turn_ms: u128::from(r.turn_secs) * 1000,
            })
            .collect()
    }

    /// The stock gym floor catalog, useful for demos and tests.
    pub fn gym_default() -> Self {
        let entries: &[(&str, &str, u64)] = &[
            ("bench-press", "Bench Press", 10),
            ("squat-rack", "Squat Rack", 10),
            ("deadlift-platform", "Deadlift Platform", 8),
            ("cable-machine", "Cable Machine", 7),
            ("leg-press", "Leg Press", 8),
            ("pull-up-bar", "Pull-Up Bar", 5),
            ("rowing-machine", "Rowing Machine", 10),
            ("treadmill", "Treadmill", 10),
        ];
        Self {
            claim_grace_secs: default_claim_grace_secs(),
            sweep_interval_ms: default_sweep_interval_ms(),
            resources: entries
                .iter()
                .map(|(id, name, minutes)| ResourceConfig {
                    id: (*id).to_owned(),
                    display_name: (*name).to_owned(),
                    turn_secs: minutes * 60,
                })
                .collect(),
        }
    }
}
