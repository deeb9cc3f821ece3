//! Tests for the credential-resolving API facade

use std::sync::Arc;
use std::time::Duration;

use gymqueue::core::{
    Credential, InMemoryIdentityProvider, Resource, ResourceScheduler, SchedulerError,
    SchedulerSettings, UserStatus,
};
use gymqueue::runtime::api;
use gymqueue::runtime::ResourceRequest;
use gymqueue::util::clock::ManualClock;
use gymqueue::util::tag::encode_tag;

fn scheduler() -> ResourceScheduler {
    ResourceScheduler::new(
        SchedulerSettings {
            claim_grace: Duration::from_secs(120),
        },
        vec![Resource {
            id: "cable-machine".into(),
            display_name: "Cable Machine".into(),
            turn_ms: 420_000,
        }],
        Arc::new(ManualClock::new(0)),
    )
}

fn provider() -> InMemoryIdentityProvider {
    let provider = InMemoryIdentityProvider::with_admin("admin", "admin123", "Admin");
    provider.register("alice", "s3cret", "Alice").unwrap();
    provider
}

fn cred(username: &str, password: &str) -> Credential {
    Credential {
        username: username.into(),
        password: password.into(),
    }
}

fn request(username: &str, password: &str) -> ResourceRequest {
    ResourceRequest {
        credential: cred(username, password),
        resource_id: "cable-machine".into(),
    }
}

#[tokio::test]
async fn join_accept_end_through_the_facade() {
    let sched = scheduler();
    let ident = provider();
    let req = request("alice", "s3cret");

    let joined = api::join(&sched, &ident, &req).await.unwrap();
    assert_eq!(joined.position, 1);

    let session = api::accept_claim(&sched, &ident, &req).await.unwrap();
    assert_eq!(session.user_id, "alice");

    let status = api::status(&sched, &ident, &req).await.unwrap();
    assert_eq!(status.status, UserStatus::Active);

    api::end_session(&sched, &ident, &req).await.unwrap();
    let status = api::status(&sched, &ident, &req).await.unwrap();
    assert_eq!(status.status, UserStatus::Absent);
}

#[tokio::test]
async fn bad_credentials_never_reach_the_scheduler() {
    let sched = scheduler();
    let ident = provider();
    let req = request("alice", "wrong");

    let err = api::join(&sched, &ident, &req).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Auth(_)));
    assert_eq!(sched.snapshot("cable-machine").unwrap().queue.len(), 0);
}

#[tokio::test]
async fn leave_through_the_facade() {
    let sched = scheduler();
    let ident = provider();
    let req = request("alice", "s3cret");

    api::join(&sched, &ident, &req).await.unwrap();
    api::leave(&sched, &ident, &req).await.unwrap();
    let status = api::status(&sched, &ident, &req).await.unwrap();
    assert_eq!(status.status, UserStatus::Absent);
}

#[test]
fn scan_tag_resolves_configured_resources() {
    let sched = scheduler();
    let tag = encode_tag("cable-machine");
    assert_eq!(api::scan_tag(&sched, &tag).unwrap(), "cable-machine");

    assert!(matches!(
        api::scan_tag(&sched, "GYMQ:lat-pulldown").unwrap_err(),
        SchedulerError::UnknownResource(_)
    ));
    assert!(matches!(
        api::scan_tag(&sched, "cable-machine").unwrap_err(),
        SchedulerError::UnknownResource(_)
    ));
}

#[tokio::test]
async fn admin_overview_requires_the_admin_role() {
    let sched = scheduler();
    let ident = provider();

    api::join(&sched, &ident, &request("alice", "s3cret"))
        .await
        .unwrap();

    let err = api::admin_overview(&sched, &ident, &cred("alice", "s3cret"))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Auth(_)));

    let overview = api::admin_overview(&sched, &ident, &cred("admin", "admin123"))
        .await
        .unwrap();
    assert_eq!(overview.stats.total_queued, 1);
    assert_eq!(overview.stats.pending_claims, 1);
    assert_eq!(overview.resources.len(), 1);
}

#[test]
fn health_is_ok() {
    assert!(api::health().ok);
}
