//! Tests for configuration validation

use gymqueue::config::{ResourceConfig, SchedulerConfig};

fn resource(id: &str, turn_secs: u64) -> ResourceConfig {
    ResourceConfig {
        id: id.to_string(),
        display_name: id.to_uppercase(),
        turn_secs,
    }
}

#[test]
fn test_valid_config() {
    let cfg = SchedulerConfig {
        claim_grace_secs: 120,
        sweep_interval_ms: 500,
        resources: vec![resource("bench-press", 600)],
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_zero_turn_is_rejected() {
    let cfg = SchedulerConfig {
        claim_grace_secs: 120,
        sweep_interval_ms: 500,
        resources: vec![resource("bench-press", 0)],
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_empty_catalog_is_rejected() {
    let cfg = SchedulerConfig {
        claim_grace_secs: 120,
        sweep_interval_ms: 500,
        resources: vec![],
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let cfg = SchedulerConfig {
        claim_grace_secs: 120,
        sweep_interval_ms: 500,
        resources: vec![resource("bench-press", 600), resource("bench-press", 300)],
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_sweep_must_undercut_grace() {
    let cfg = SchedulerConfig {
        claim_grace_secs: 1,
        sweep_interval_ms: 1_000,
        resources: vec![resource("bench-press", 600)],
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_applies_defaults() {
    let json = r#"{
        "resources": [
            { "id": "treadmill", "display_name": "Treadmill", "turn_secs": 600 }
        ]
    }"#;
    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.claim_grace_secs, 120);
    assert_eq!(cfg.sweep_interval_ms, 500);
    assert_eq!(cfg.resources.len(), 1);
}

#[test]
fn test_gym_default_catalog() {
    let cfg = SchedulerConfig::gym_default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.resources.len(), 8);
    let catalog = cfg.resource_catalog();
    let bench = catalog.iter().find(|r| r.id == "bench-press").unwrap();
    assert_eq!(bench.turn_ms, 10 * 60 * 1000);
}
