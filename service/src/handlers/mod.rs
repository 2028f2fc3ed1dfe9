//! Axum HTTP handlers for the request approval service.
//!
//! Handlers extract the caller identity, enforce the per-route role
//! requirement, call the domain layer, and map results (and errors)
//! back to HTTP.

pub mod identity;
pub mod requests;
pub mod users;

use axum::http::StatusCode;
use request_service_web::AppError;
use std::sync::Arc;

use crate::directory::UserDirectory;
use crate::error::RequestError;
use crate::lifecycle::RequestLifecycle;
use crate::providers::{RequestRepository, UserRepository};
use crate::query::RequestQueries;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
pub struct AppState<R, U> {
    /// The request lifecycle engine.
    pub lifecycle: Arc<RequestLifecycle<R, U>>,
    /// The query/formatting layer.
    pub queries: Arc<RequestQueries<R, U>>,
    /// The admin user directory.
    pub directory: Arc<UserDirectory<U>>,
}

impl<R, U> AppState<R, U>
where
    R: RequestRepository,
    U: UserRepository,
{
    /// Create the shared state from the three domain layers.
    #[must_use]
    pub fn new(
        lifecycle: RequestLifecycle<R, U>,
        queries: RequestQueries<R, U>,
        directory: UserDirectory<U>,
    ) -> Self {
        Self {
            lifecycle: Arc::new(lifecycle),
            queries: Arc::new(queries),
            directory: Arc::new(directory),
        }
    }
}

// Manual Clone: the `Arc`s are cheaply clonable regardless of whether
// the repositories themselves are.
impl<R, U> Clone for AppState<R, U> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: Arc::clone(&self.lifecycle),
            queries: Arc::clone(&self.queries),
            directory: Arc::clone(&self.directory),
        }
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            RequestError::IdentifierMismatch(_)
            | RequestError::StageTransition(_)
            | RequestError::Validation(_) => Self::bad_request(err.to_string()),
            RequestError::Database(_) | RequestError::Internal => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
        }
    }
}

/// Parse a numeric path segment, surfacing number-format errors as a
/// 400 with the standard error body.
fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid {what}: {raw}")))
}

/// Parse the `page` query parameter.
fn parse_page(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid page number: {raw}")))
}
