//! User repository trait.

use crate::error::Result;
use crate::state::{Role, User, UserId};
use std::future::Future;

/// User repository.
///
/// Users are created by an external system; this service reads them and
/// grows their role sets.
pub trait UserRepository: Send + Sync {
    /// Get a user by id, roles included.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the store query fails
    /// - the user does not exist → `RequestError::NotFound`
    fn find_by_id(&self, id: UserId) -> impl Future<Output = Result<User>> + Send;

    /// All users, roles included.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_all(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Users whose name/surname equals the two tokens in either order:
    /// `(name = part1 AND surname = part2) OR (name = part2 AND
    /// surname = part1)`. Literal equality, not a substring match.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn find_by_name(
        &self,
        name_part1: &str,
        name_part2: &str,
    ) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Add `role` to the user's role set and return the updated user.
    /// Idempotent: adding a role the user already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the store query fails
    /// - the user does not exist → `RequestError::NotFound`
    fn add_role(&self, id: UserId, role: Role) -> impl Future<Output = Result<User>> + Send;
}
