//! End-to-end workflow tests over the in-memory collaborators.
//!
//! Drives the lifecycle engine and the query layer together the way
//! the HTTP handlers do, without the HTTP surface.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use request_service::directory::UserDirectory;
use request_service::lifecycle::RequestLifecycle;
use request_service::mocks::{FixedClock, MockRequestRepository, MockUserRepository};
use request_service::query::RequestQueries;
use request_service::{CallerIdentity, PaginationConfig, RequestError, Role, Stage, UserId};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    users: MockUserRepository,
    requests: MockRequestRepository,
    lifecycle: RequestLifecycle<MockRequestRepository, MockUserRepository>,
    queries: RequestQueries<MockRequestRepository, MockUserRepository>,
    directory: UserDirectory<MockUserRepository>,
}

fn fixture() -> Fixture {
    let users = MockUserRepository::new();
    let requests = MockRequestRepository::with_users(&users);
    let clock = Arc::new(FixedClock::new(date(2024, 5, 5)));

    Fixture {
        lifecycle: RequestLifecycle::new(requests.clone(), users.clone(), clock),
        queries: RequestQueries::new(
            requests.clone(),
            users.clone(),
            PaginationConfig::default(),
        ),
        directory: UserDirectory::new(users.clone()),
        users,
        requests,
    }
}

#[tokio::test]
async fn test_full_lifecycle_draft_to_approved() {
    let fx = fixture();
    let owner = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);

    // Create in Draft.
    let request = fx.lifecycle.create(owner.id, "new laptop").await.unwrap();
    assert_eq!(request.stage, Stage::Draft);
    assert_eq!(request.created_at, date(2024, 5, 5));

    // Edit while in Draft.
    let request = fx
        .lifecycle
        .update_description(request.id, owner.id, "new laptop, 32GB")
        .await
        .unwrap();
    assert_eq!(request.description, "new laptop, 32GB");

    // Submit, then approve.
    let request = fx.lifecycle.submit(request.id, owner.id, "DRAFT").await.unwrap();
    assert_eq!(request.stage, Stage::Submitted);

    let request = fx
        .lifecycle
        .approve(request.id, owner.id, "SUBMITTED")
        .await
        .unwrap();
    assert_eq!(request.stage, Stage::Approved);

    // Terminal: no further transition may leave Approved.
    let err = fx
        .lifecycle
        .submit(request.id, owner.id, "DRAFT")
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::StageTransition(_)));
    assert_eq!(fx.requests.get(request.id).unwrap().stage, Stage::Approved);
}

#[tokio::test]
async fn test_full_lifecycle_draft_to_rejected() {
    let fx = fixture();
    let owner = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);

    let request = fx.lifecycle.create(owner.id, "travel budget").await.unwrap();
    let request = fx.lifecycle.submit(request.id, owner.id, "DRAFT").await.unwrap();
    let request = fx
        .lifecycle
        .reject(request.id, owner.id, "SUBMITTED")
        .await
        .unwrap();

    assert_eq!(request.stage, Stage::Rejected);
}

#[tokio::test]
async fn test_draft_never_approvable_directly() {
    let fx = fixture();
    let owner = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);
    let request = fx.lifecycle.create(owner.id, "skip the queue").await.unwrap();

    // Draft → Approved is not in the transition table, whatever token
    // the caller asserts.
    for token in ["DRAFT", "SUBMITTED", "APPROVED", ""] {
        let err = fx
            .lifecycle
            .approve(request.id, owner.id, token)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::StageTransition(_)));
    }
    assert_eq!(fx.requests.get(request.id).unwrap().stage, Stage::Draft);
}

#[tokio::test]
async fn test_operator_queue_reflects_submissions() {
    let fx = fixture();
    let ann = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);
    let bob = fx.users.add_user("bob", "Bob", "Smith", [Role::User]);

    let a = fx.lifecycle.create(ann.id, "abc").await.unwrap();
    let b = fx.lifecycle.create(bob.id, "xyz").await.unwrap();
    fx.lifecycle.submit(a.id, ann.id, "DRAFT").await.unwrap();

    let queue = fx.queries.operator_queue("default", 0).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].request_id, a.id);
    assert_eq!(queue[0].description, "a-b-c");
    assert_eq!(queue[0].owner_name, "Ann");

    fx.lifecycle.submit(b.id, bob.id, "DRAFT").await.unwrap();
    let queue = fx.queries.operator_queue("default", 0).await.unwrap();
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn test_owner_view_and_operator_view_differ() {
    let fx = fixture();
    let owner = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);
    let request = fx.lifecycle.create(owner.id, "abc").await.unwrap();

    let as_owner = CallerIdentity::new(owner.id, [Role::User]);
    let as_operator = CallerIdentity::new(UserId(99), [Role::User, Role::Operator]);

    let plain = fx.queries.get_by_id(request.id, &as_owner).await.unwrap();
    let redacted = fx.queries.get_by_id(request.id, &as_operator).await.unwrap();

    assert_eq!(plain.description, "abc");
    assert_eq!(redacted.description, "a-b-c");
    assert_eq!(plain.stage, "DRAFT");
}

#[tokio::test]
async fn test_promotion_enables_nothing_but_is_recorded() {
    let fx = fixture();
    let user = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);

    let promoted = fx.directory.promote_to_operator(user.id).await.unwrap();
    assert!(promoted.roles.contains(&Role::Operator));
    assert!(promoted.roles.contains(&Role::User));

    // Idempotent under repetition.
    let again = fx.directory.promote_to_operator(user.id).await.unwrap();
    assert_eq!(again.roles.len(), 2);

    let listed = fx.directory.list_users().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].roles.contains(&Role::Operator));
}

#[tokio::test]
async fn test_search_surfaces_requests_for_matching_owner() {
    let fx = fixture();
    let ann = fx.users.add_user("ann", "Ann", "Lee", [Role::User]);
    fx.users.add_user("bob", "Bob", "Smith", [Role::User]);

    let request = fx.lifecycle.create(ann.id, "abc").await.unwrap();
    fx.lifecycle.submit(request.id, ann.id, "DRAFT").await.unwrap();

    let found = fx.queries.search_by_name("Lee Ann", "default", 0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].owner_user_id, ann.id);
    assert_eq!(found[0].description, "a-b-c");

    // A lone token pairs with an empty second token; Ann has a
    // surname, so it does not match her.
    let none = fx.queries.search_by_name("Ann", "default", 0).await.unwrap();
    assert!(none.is_empty());

    let miss = fx.queries.search_by_name("Leeann", "default", 0).await.unwrap();
    assert!(miss.is_empty());
}
