//! Admin endpoint handlers for user management.

use axum::{
    extract::{Path, State},
    Json,
};
use request_service_web::AppError;

use super::{parse_id, AppState};
use crate::providers::{RequestRepository, UserRepository};
use crate::state::{CallerIdentity, Role, User, UserId};

/// List all users with their role sets.
///
/// # Endpoint
///
/// ```text
/// GET /users/list
/// ```
///
/// Requires the Admin role.
pub async fn list_users<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
) -> Result<Json<Vec<User>>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Admin)?;

    let users = state.directory.list_users().await?;
    Ok(Json(users))
}

/// Search users by full name (first-space tokenization, symmetric
/// name/surname equality).
///
/// # Endpoint
///
/// ```text
/// GET /users/{name}
/// ```
///
/// Requires the Admin role.
pub async fn search_users<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Path(name): Path<String>,
) -> Result<Json<Vec<User>>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Admin)?;

    let users = state.directory.search_by_name(&name).await?;
    Ok(Json(users))
}

/// Promote a user to operator; existing roles remain. Idempotent.
///
/// # Endpoint
///
/// ```text
/// POST /users/{user_id}
/// ```
///
/// Requires the Admin role.
pub async fn promote_user<R, U>(
    State(state): State<AppState<R, U>>,
    identity: CallerIdentity,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError>
where
    R: RequestRepository + 'static,
    U: UserRepository + 'static,
{
    identity.require(Role::Admin)?;

    let user_id = parse_id(&user_id, "user id")?;
    let user = state
        .directory
        .promote_to_operator(UserId(user_id))
        .await?;
    Ok(Json(user))
}
