//! Request repository trait.

use super::{PageRequest, SortOrder};
use crate::error::Result;
use crate::state::{Request, RequestId, Stage, UserId};
use chrono::NaiveDate;
use std::future::Future;

/// Request repository.
///
/// Abstracts over request persistence. Each mutating method issues
/// exactly one persisted write; implementations must never leave a
/// partial mutation observable on failure.
pub trait RequestRepository: Send + Sync {
    /// Get a request by id.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the store query fails
    /// - the request does not exist → `RequestError::NotFound`
    fn find_by_id(&self, id: RequestId) -> impl Future<Output = Result<Request>> + Send;

    /// Insert a new request in `Draft`, letting the store assign its
    /// id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails or the owner reference
    /// does not resolve.
    fn insert(
        &self,
        owner: UserId,
        created_at: NaiveDate,
        description: &str,
    ) -> impl Future<Output = Result<Request>> + Send;

    /// Replace a request's description.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the store query fails
    /// - the request does not exist → `RequestError::NotFound`
    fn update_description(
        &self,
        id: RequestId,
        description: &str,
    ) -> impl Future<Output = Result<Request>> + Send;

    /// Move a request from `from` to `to` as a single compare-and-swap:
    /// the update applies only if the stored stage still equals `from`.
    ///
    /// Returns `None` when no row matched (the request is gone or its
    /// stage changed concurrently); the caller decides how to surface
    /// that. Two racing transitions on one request can never both
    /// observe a `Some`.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn update_stage(
        &self,
        id: RequestId,
        from: Stage,
        to: Stage,
    ) -> impl Future<Output = Result<Option<Request>>> + Send;

    /// List requests owned by `owner`, any stage, sorted by creation
    /// date.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_by_owner(
        &self,
        owner: UserId,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send;

    /// List requests currently in `stage`, sorted by creation date.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_by_stage(
        &self,
        stage: Stage,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send;

    /// List requests whose owner's name/surname equals the two tokens
    /// in either order: `(name = part1 AND surname = part2) OR
    /// (name = part2 AND surname = part1)`. Literal equality, not a
    /// substring match.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_by_owner_name(
        &self,
        name_part1: &str,
        name_part2: &str,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send;
}
