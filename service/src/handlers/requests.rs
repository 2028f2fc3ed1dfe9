//! Request endpoint handlers.
//!
//! The user-facing lifecycle endpoints (create, edit, submit), the
//! operator endpoints (queue, search, approve, reject), and the shared
//! fetch-by-id endpoint.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use request_service_web::{AppError, CorrelationId};
use serde::{Deserialize, Serialize};

use super::{parse_id, parse_page, AppState};
use crate::providers::{RequestRepository, UserRepository};
use crate::query::RequestView;
use crate::state::{CallerIdentity, RequestId, Role, UserId};

/// Body for creating a request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    /// The author the request is created for.
    pub owner_id: i64,
    /// Initial description.
    pub description: String,
}

/// Body for replacing a request's description.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescriptionBody {
    /// The request to edit.
    pub request_id: i64,
    /// The asserted author.
    pub owner_id: i64,
    /// Replacement description.
    pub description: String,
}

/// Body for a stage transition (send, approve, reject).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStageBody {
    /// The request to transition.
    pub request_id: i64,
    /// The asserted author of the request.
    pub owner_id: i64,
    /// The stage token the caller believes the request is in.
    pub current_stage: String,
}

/// Sort and page query parameters shared by the listing endpoints.
///
/// `page` stays a string here so malformed numbers surface through the
/// standard error body rather than the framework's rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// `"default"` (ascending) or `"reverse"` (descending); anything
    /// else silently sorts ascending.
    #[serde(default = "default_sort")]
    pub sort: String,
    /// Zero-based page index.
    #[serde(default = "default_page")]
    pub page: String,
}

fn default_sort() -> String {
    "default".to_string()
}

fn default_page() -> String {
    "0".to_string()
}

/// Create a new request in `Draft`.
///
/// # Endpoint
///
/// ```text
/// POST /request/create
/// {"ownerId": 1, "description": "new laptop"}
/// ```
///
/// Requires the User role. Responds `201 Created` with the request
/// view.
pub async fn create_request<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    correlation_id: CorrelationId,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestView>), AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::User)?;

    let request = state
        .lifecycle
        .create(UserId(body.owner_id), &body.description)
        .await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        request_id = %request.id,
        "Create request accepted"
    );

    let view = state.queries.render(&request, false).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// List a user's requests, any stage, sorted and paged.
///
/// # Endpoint
///
/// ```text
/// GET /request/list/{user_id}?sort=default&page=0
/// ```
///
/// Requires the User role.
pub async fn list_user_requests<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RequestView>>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::User)?;

    let user_id = parse_id(&user_id, "user id")?;
    let page = parse_page(&params.page)?;

    let views = state
        .queries
        .list_by_owner(UserId(user_id), &params.sort, page)
        .await?;
    Ok(Json(views))
}

/// Replace a request's description. Owner only; no stage restriction.
///
/// # Endpoint
///
/// ```text
/// POST /request/change-description
/// {"requestId": 1, "ownerId": 1, "description": "updated"}
/// ```
///
/// Requires the User role.
pub async fn change_description<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Json(body): Json<ChangeDescriptionBody>,
) -> Result<Json<RequestView>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::User)?;

    let request = state
        .lifecycle
        .update_description(
            RequestId(body.request_id),
            UserId(body.owner_id),
            &body.description,
        )
        .await?;

    let view = state.queries.render(&request, false).await?;
    Ok(Json(view))
}

/// Send a draft to the operator queue (`Draft → Submitted`).
///
/// # Endpoint
///
/// ```text
/// POST /request/send
/// {"requestId": 1, "ownerId": 1, "currentStage": "DRAFT"}
/// ```
///
/// Requires the User role.
pub async fn send_request<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    correlation_id: CorrelationId,
    Json(body): Json<SetStageBody>,
) -> Result<Json<RequestView>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::User)?;

    let request = state
        .lifecycle
        .submit(
            RequestId(body.request_id),
            UserId(body.owner_id),
            &body.current_stage,
        )
        .await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        request_id = %request.id,
        "Request submitted to operator queue"
    );

    let view = state.queries.render(&request, false).await?;
    Ok(Json(view))
}

/// The operator queue: submitted requests, descriptions redacted.
///
/// # Endpoint
///
/// ```text
/// GET /request/all-requests?sort=reverse&page=0
/// ```
///
/// Requires the Operator role.
pub async fn operator_queue<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RequestView>>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Operator)?;

    let page = parse_page(&params.page)?;
    let views = state.queries.operator_queue(&params.sort, page).await?;
    Ok(Json(views))
}

/// Search requests by the owner's full name, descriptions redacted.
///
/// The path segment is split on the first space; the two tokens must
/// equal the owner's name and surname in either order.
///
/// # Endpoint
///
/// ```text
/// GET /request/requests/{name}?sort=default&page=0
/// ```
///
/// Requires the Operator role.
pub async fn search_requests<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Path(name): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RequestView>>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Operator)?;

    let page = parse_page(&params.page)?;
    let views = state.queries.search_by_name(&name, &params.sort, page).await?;
    Ok(Json(views))
}

/// Approve a submitted request (`Submitted → Approved`).
///
/// # Endpoint
///
/// ```text
/// POST /request/approve
/// {"requestId": 1, "ownerId": 1, "currentStage": "SUBMITTED"}
/// ```
///
/// Requires the Operator role. `ownerId` asserts the request author's
/// id, not the operator's.
pub async fn approve_request<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    correlation_id: CorrelationId,
    Json(body): Json<SetStageBody>,
) -> Result<Json<RequestView>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Operator)?;

    let request = state
        .lifecycle
        .approve(
            RequestId(body.request_id),
            UserId(body.owner_id),
            &body.current_stage,
        )
        .await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        request_id = %request.id,
        "Request approved"
    );

    let view = state.queries.render(&request, false).await?;
    Ok(Json(view))
}

/// Reject a submitted request (`Submitted → Rejected`).
///
/// # Endpoint
///
/// ```text
/// POST /request/reject
/// {"requestId": 1, "ownerId": 1, "currentStage": "SUBMITTED"}
/// ```
///
/// Requires the Operator role. `ownerId` asserts the request author's
/// id, not the operator's.
pub async fn reject_request<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    correlation_id: CorrelationId,
    Json(body): Json<SetStageBody>,
) -> Result<Json<RequestView>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Operator)?;

    let request = state
        .lifecycle
        .reject(
            RequestId(body.request_id),
            UserId(body.owner_id),
            &body.current_stage,
        )
        .await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        request_id = %request.id,
        "Request rejected"
    );

    let view = state.queries.render(&request, false).await?;
    Ok(Json(view))
}

/// Fetch one request by id.
///
/// # Endpoint
///
/// ```text
/// GET /request/{request_id}
/// ```
///
/// Requires the User or Operator role. The description is redacted
/// exactly when the caller holds Operator.
pub async fn get_request<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Path(request_id): Path<String>,
) -> Result<Json<RequestView>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require_any(&[Role::User, Role::Operator])?;

    let request_id = parse_id(&request_id, "request id")?;
    let view = state
        .queries
        .get_by_id(RequestId(request_id), &identity)
        .await?;
    Ok(Json(view))
}
