//! Tests for error types

use gymqueue::core::SchedulerError;

#[test]
fn test_unknown_resource_error() {
    let err = SchedulerError::UnknownResource("lat-pulldown".to_string());
    assert_eq!(format!("{}", err), "unknown resource: lat-pulldown");
}

#[test]
fn test_queue_membership_errors() {
    assert_eq!(format!("{}", SchedulerError::AlreadyQueued), "already queued");
    assert_eq!(format!("{}", SchedulerError::NotQueued), "not queued");
}

#[test]
fn test_claim_errors() {
    assert_eq!(format!("{}", SchedulerError::NoClaim), "no claim");
    assert_eq!(format!("{}", SchedulerError::ClaimNotOwned), "claim not owned");
}

#[test]
fn test_session_errors() {
    assert_eq!(format!("{}", SchedulerError::NoSession), "no session");
    assert_eq!(
        format!("{}", SchedulerError::SessionNotOwned),
        "session not owned"
    );
}

#[test]
fn test_auth_error() {
    let err = SchedulerError::Auth("invalid username or password".to_string());
    assert_eq!(format!("{}", err), "auth error: invalid username or password");
}
