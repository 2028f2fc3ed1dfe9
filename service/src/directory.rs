//! Admin-facing user directory.
//!
//! Listing, name search, and operator promotion. Users themselves are
//! created by an external system; this layer only reads them and grows
//! their role sets.

use crate::error::{RequestError, Result};
use crate::providers::UserRepository;
use crate::query::split_full_name;
use crate::state::{Role, User, UserId};

/// User directory over the user store collaborator.
pub struct UserDirectory<U> {
    users: U,
}

impl<U> UserDirectory<U>
where
    U: UserRepository,
{
    /// Create a directory over the given collaborator.
    pub const fn new(users: U) -> Self {
        Self { users }
    }

    /// All users, roles included.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.users.list_all().await
    }

    /// Users matching a full-name query: split on the first space, the
    /// two tokens must equal name and surname in either order. Same
    /// literal tokenization as the request search.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    pub async fn search_by_name(&self, query: &str) -> Result<Vec<User>> {
        let (part1, part2) = split_full_name(query);
        self.users.find_by_name(part1, part2).await
    }

    /// Add the Operator role to a user; existing roles remain.
    /// Idempotent: promoting twice leaves Operator in the set exactly
    /// once.
    ///
    /// # Errors
    ///
    /// - `IdentifierMismatch` if the user does not exist
    /// - `Database` if the store fails
    pub async fn promote_to_operator(&self, id: UserId) -> Result<User> {
        match self.users.add_role(id, Role::Operator).await {
            Ok(user) => {
                tracing::info!(user_id = %id, "User promoted to operator");
                Ok(user)
            }
            Err(RequestError::NotFound { .. }) => Err(RequestError::IdentifierMismatch(
                format!("User with ID {id} not found"),
            )),
            Err(e) => Err(e),
        }
    }
}
