//! Mock user repository for testing.

use crate::error::{RequestError, Result};
use crate::providers::UserRepository;
use crate::state::{Role, User, UserId};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<UserId, User>,
}

/// Mock user repository backed by in-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MockUserRepository {
    /// Create an empty mock repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user, assigning the next id. Test helper.
    pub fn add_user(
        &self,
        login: &str,
        name: &str,
        surname: &str,
        roles: impl IntoIterator<Item = Role>,
    ) -> User {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let user = User {
            id: UserId(inner.next_id),
            login: login.to_string(),
            name: name.to_string(),
            surname: surname.to_string(),
            roles: roles.into_iter().collect(),
        };
        inner.users.insert(user.id, user.clone());
        user
    }

    /// Ids of users matching the symmetric name/surname equality used
    /// by the name-search queries.
    pub(crate) fn ids_matching_name(&self, part1: &str, part2: &str) -> Vec<UserId> {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inner
            .users
            .values()
            .filter(|u| {
                (u.name == part1 && u.surname == part2)
                    || (u.name == part2 && u.surname == part1)
            })
            .map(|u| u.id)
            .collect()
    }
}

impl UserRepository for MockUserRepository {
    fn find_by_id(&self, id: UserId) -> impl Future<Output = Result<User>> + Send {
        async move {
            let inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            inner
                .users
                .get(&id)
                .cloned()
                .ok_or(RequestError::user_not_found(id))
        }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<User>>> + Send {
        async move {
            let inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(inner.users.values().cloned().collect())
        }
    }

    fn find_by_name(
        &self,
        name_part1: &str,
        name_part2: &str,
    ) -> impl Future<Output = Result<Vec<User>>> + Send {
        async move {
            let inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Ok(inner
                .users
                .values()
                .filter(|u| {
                    (u.name == name_part1 && u.surname == name_part2)
                        || (u.name == name_part2 && u.surname == name_part1)
                })
                .cloned()
                .collect())
        }
    }

    fn add_role(&self, id: UserId, role: Role) -> impl Future<Output = Result<User>> + Send {
        async move {
            let mut inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let user = inner
                .users
                .get_mut(&id)
                .ok_or(RequestError::user_not_found(id))?;
            user.roles.insert(role);
            Ok(user.clone())
        }
    }
}
