//! Caller identity extraction.
//!
//! The authentication subsystem lives upstream; it conveys the resolved
//! caller through trusted headers. This module turns those headers into
//! a [`CallerIdentity`] and gives handlers the role guards they enforce
//! per route.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn approve_request(
//!     identity: CallerIdentity,
//!     ...
//! ) -> Result<Json<RequestView>, AppError> {
//!     identity.require(Role::Operator)?;
//!     ...
//! }
//! ```

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use request_service_web::AppError;
use std::collections::BTreeSet;

use crate::state::{CallerIdentity, Role, UserId};

/// Header carrying the resolved caller id (decimal).
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the resolved role set (comma-separated tokens).
pub const USER_ROLES_HEADER: &str = "X-User-Roles";

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing X-User-Id header"))?;

        let user_id: i64 = raw_id
            .trim()
            .parse()
            .map_err(|_| AppError::bad_request(format!("Invalid user id: {raw_id}")))?;

        let raw_roles = parts
            .headers
            .get(USER_ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing X-User-Roles header"))?;

        let mut roles = BTreeSet::new();
        for token in raw_roles.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let role = Role::from_token(token)
                .ok_or_else(|| AppError::bad_request(format!("Unknown role: {token}")))?;
            roles.insert(role);
        }

        if roles.is_empty() {
            return Err(AppError::unauthorized("No roles resolved for caller"));
        }

        Ok(Self {
            user_id: UserId(user_id),
            roles,
        })
    }
}

impl CallerIdentity {
    /// Require one role, else 403.
    ///
    /// # Errors
    ///
    /// Returns `AppError::forbidden` if the capability set does not
    /// contain `role`.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{role} role required")))
        }
    }

    /// Require at least one of `roles`, else 403.
    ///
    /// # Errors
    ///
    /// Returns `AppError::forbidden` if none of `roles` is held.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.iter().any(|role| self.has_role(*role)) {
            Ok(())
        } else {
            let wanted: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
            Err(AppError::forbidden(format!(
                "One of roles {} required",
                wanted.join(", ")
            )))
        }
    }
}
