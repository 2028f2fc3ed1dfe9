//! Router composition.
//!
//! Composes the request and user handlers into Axum routers. The
//! server nests these under `/request` and `/users` and wires the
//! cross-cutting layers (tracing, correlation ids) around them.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{requests, users, AppState};
use crate::providers::{RequestRepository, UserRepository};

/// Request endpoints, nested under `/request` by the server.
///
/// # Routes
///
/// ## User
/// - `POST /create` - create a request in Draft
/// - `GET /list/:user_id` - list a user's requests
/// - `POST /change-description` - edit a request's description
/// - `POST /send` - submit a draft to the operator queue
///
/// ## Operator
/// - `GET /all-requests` - the submitted queue (redacted)
/// - `GET /requests/:name` - search by owner name (redacted)
/// - `POST /approve` - approve a submitted request
/// - `POST /reject` - reject a submitted request
///
/// ## Shared
/// - `GET /:request_id` - fetch one request (redacted iff operator)
pub fn request_router<R, U>(state: AppState<R, U>) -> Router
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    Router::new()
        .route("/create", post(requests::create_request::<R, U>))
        .route("/list/:user_id", get(requests::list_user_requests::<R, U>))
        .route(
            "/change-description",
            post(requests::change_description::<R, U>),
        )
        .route("/send", post(requests::send_request::<R, U>))
        .route("/all-requests", get(requests::operator_queue::<R, U>))
        .route("/requests/:name", get(requests::search_requests::<R, U>))
        .route("/approve", post(requests::approve_request::<R, U>))
        .route("/reject", post(requests::reject_request::<R, U>))
        .route("/:request_id", get(requests::get_request::<R, U>))
        .with_state(state)
}

/// Admin user endpoints, nested under `/users` by the server.
///
/// # Routes
///
/// - `GET /list` - all users with roles
/// - `GET /:name` - search users by full name
/// - `POST /:user_id` - promote a user to operator
///
/// The two dynamic routes share one path segment; the GET side treats
/// it as a name, the POST side parses it as a numeric user id.
pub fn users_router<R, U>(state: AppState<R, U>) -> Router
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    Router::new()
        .route("/list", get(users::list_users::<R, U>))
        .route(
            "/:name",
            get(users::search_users::<R, U>).post(users::promote_user::<R, U>),
        )
        .with_state(state)
}
