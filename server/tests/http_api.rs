//! HTTP API tests over the in-memory collaborators.
//!
//! Exercises the full router the way a client would: identity headers,
//! JSON bodies, role enforcement, error body shape.

#![allow(clippy::unwrap_used)]

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::{routing::get, Router};
use axum_test::{TestRequest, TestServer};
use chrono::NaiveDate;
use request_service::directory::UserDirectory;
use request_service::handlers::AppState;
use request_service::lifecycle::RequestLifecycle;
use request_service::mocks::{FixedClock, MockRequestRepository, MockUserRepository};
use request_service::query::{RequestQueries, RequestView};
use request_service::router::{request_router, users_router};
use request_service::{PaginationConfig, Role, Stage, User, UserId};
use serde_json::{json, Value};
use std::sync::Arc;

struct TestApp {
    server: TestServer,
    users: MockUserRepository,
    requests: MockRequestRepository,
}

fn app() -> TestApp {
    let users = MockUserRepository::new();
    let requests = MockRequestRepository::with_users(&users);
    let clock = Arc::new(FixedClock::new(
        NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
    ));

    let state = AppState::new(
        RequestLifecycle::new(requests.clone(), users.clone(), clock),
        RequestQueries::new(requests.clone(), users.clone(), PaginationConfig::default()),
        UserDirectory::new(users.clone()),
    );

    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/request", request_router(state.clone()))
        .nest("/users", users_router(state))
        .layer(request_service_web::correlation_id_layer());

    TestApp {
        server: TestServer::new(router).unwrap(),
        users,
        requests,
    }
}

trait WithIdentity {
    fn with_identity(self, id: i64, roles: &str) -> Self;
}

impl WithIdentity for TestRequest {
    fn with_identity(self, id: i64, roles: &str) -> Self {
        self.add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_str(&id.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static("x-user-roles"),
            HeaderValue::from_str(roles).unwrap(),
        )
    }
}

#[tokio::test]
async fn test_full_request_flow_over_http() {
    let app = app();
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);
    let operator = app.users.add_user("op", "Olga", "Petrova", [Role::User, Role::Operator]);

    // Create
    let response = app
        .server
        .post("/request/create")
        .with_identity(ann.id.0, "USER")
        .json(&json!({"ownerId": ann.id.0, "description": "new laptop"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let view: RequestView = response.json();
    assert_eq!(view.stage, "DRAFT");
    assert_eq!(view.owner_name, "Ann");
    assert_eq!(view.owner_surname, "Lee");
    assert_eq!(view.description, "new laptop");
    let request_id = view.request_id.0;

    // Edit the description
    let response = app
        .server
        .post("/request/change-description")
        .with_identity(ann.id.0, "USER")
        .json(&json!({
            "requestId": request_id,
            "ownerId": ann.id.0,
            "description": "abc"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<RequestView>().description, "abc");

    // Submit
    let response = app
        .server
        .post("/request/send")
        .with_identity(ann.id.0, "USER")
        .json(&json!({
            "requestId": request_id,
            "ownerId": ann.id.0,
            "currentStage": "DRAFT"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<RequestView>().stage, "SUBMITTED");

    // The operator queue shows it, redacted
    let response = app
        .server
        .get("/request/all-requests")
        .with_identity(operator.id.0, "USER,OPERATOR")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let queue: Vec<RequestView> = response.json();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].description, "a-b-c");

    // Approve
    let response = app
        .server
        .post("/request/approve")
        .with_identity(operator.id.0, "USER,OPERATOR")
        .json(&json!({
            "requestId": request_id,
            "ownerId": ann.id.0,
            "currentStage": "SUBMITTED"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<RequestView>().stage, "APPROVED");

    // Fetch by id: redacted for the operator, plain for the user
    let response = app
        .server
        .get(&format!("/request/{request_id}"))
        .with_identity(operator.id.0, "USER,OPERATOR")
        .await;
    assert_eq!(response.json::<RequestView>().description, "a-b-c");

    let response = app
        .server
        .get(&format!("/request/{request_id}"))
        .with_identity(ann.id.0, "USER")
        .await;
    assert_eq!(response.json::<RequestView>().description, "abc");
}

#[tokio::test]
async fn test_stage_and_owner_guards_surface_as_400() {
    let app = app();
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);
    let request = app.requests.seed(
        ann.id,
        NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
        Stage::Draft,
        "abc",
    );

    // Wrong stage token
    let response = app
        .server
        .post("/request/send")
        .with_identity(ann.id.0, "USER")
        .json(&json!({
            "requestId": request.id.0,
            "ownerId": ann.id.0,
            "currentStage": "SUBMITTED"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"].as_str().unwrap().contains("stage"));

    // Wrong owner
    let response = app
        .server
        .post("/request/send")
        .with_identity(ann.id.0, "USER")
        .json(&json!({
            "requestId": request.id.0,
            "ownerId": 4242,
            "currentStage": "DRAFT"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Nothing moved
    assert_eq!(app.requests.get(request.id).unwrap().stage, Stage::Draft);
}

#[tokio::test]
async fn test_role_enforcement() {
    let app = app();
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);

    // Plain users cannot see the operator queue
    let response = app
        .server
        .get("/request/all-requests")
        .with_identity(ann.id.0, "USER")
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Nor approve
    let response = app
        .server
        .post("/request/approve")
        .with_identity(ann.id.0, "USER")
        .json(&json!({"requestId": 1, "ownerId": 1, "currentStage": "SUBMITTED"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Nor administer users
    let response = app
        .server
        .get("/users/list")
        .with_identity(ann.id.0, "USER")
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = app();
    let response = app.server.get("/request/all-requests").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_numeric_input_is_bad_request() {
    let app = app();
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);

    // Non-numeric path id
    let response = app
        .server
        .get("/request/list/abc")
        .with_identity(ann.id.0, "USER")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 400);

    // Non-numeric page
    let response = app
        .server
        .get(&format!("/request/list/{}", ann.id.0))
        .add_query_param("page", "two")
        .with_identity(ann.id.0, "USER")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Unknown role token
    let response = app
        .server
        .get("/request/all-requests")
        .with_identity(ann.id.0, "WIZARD")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_sorting_over_http() {
    let app = app();
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);
    for day in 1..=3 {
        app.requests.seed(
            ann.id,
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            Stage::Draft,
            "d",
        );
    }

    let response = app
        .server
        .get(&format!("/request/list/{}", ann.id.0))
        .add_query_param("sort", "reverse")
        .with_identity(ann.id.0, "USER")
        .await;
    let views: Vec<RequestView> = response.json();
    assert_eq!(views.len(), 3);
    assert!(views.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    // Unrecognized sort silently falls back to ascending
    let response = app
        .server
        .get(&format!("/request/list/{}", ann.id.0))
        .add_query_param("sort", "sideways")
        .with_identity(ann.id.0, "USER")
        .await;
    let views: Vec<RequestView> = response.json();
    assert!(views.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn test_user_administration_endpoints() {
    let app = app();
    let admin = app.users.add_user("root", "Ada", "Min", [Role::Admin]);
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);

    // List
    let response = app
        .server
        .get("/users/list")
        .with_identity(admin.id.0, "ADMIN")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Vec<User>>().len(), 2);

    // Search by name (path segment)
    let response = app
        .server
        .get("/users/Lee%20Ann")
        .with_identity(admin.id.0, "ADMIN")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let found: Vec<User> = response.json();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ann.id);

    // Promote, twice: idempotent
    for _ in 0..2 {
        let response = app
            .server
            .post(&format!("/users/{}", ann.id.0))
            .with_identity(admin.id.0, "ADMIN")
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let user: User = response.json();
        assert!(user.roles.contains(&Role::Operator));
        assert!(user.roles.contains(&Role::User));
        assert_eq!(user.roles.len(), 2);
    }

    // Promote an unknown id
    let response = app
        .server
        .post("/users/4242")
        .with_identity(admin.id.0, "ADMIN")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Promote a non-numeric id: number-format error
    let response = app
        .server
        .post("/users/annie")
        .with_identity(admin.id.0, "ADMIN")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requests_by_owner_name() {
    let app = app();
    let operator = app.users.add_user("op", "Olga", "Petrova", [Role::Operator]);
    let ann = app.users.add_user("ann", "Ann", "Lee", [Role::User]);
    app.requests.seed(
        ann.id,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        Stage::Submitted,
        "abc",
    );

    let response = app
        .server
        .get("/request/requests/Ann%20Lee")
        .with_identity(operator.id.0, "OPERATOR")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let views: Vec<RequestView> = response.json();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].owner_user_id, UserId(ann.id.0));
    assert_eq!(views[0].description, "a-b-c");
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = app();
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}
