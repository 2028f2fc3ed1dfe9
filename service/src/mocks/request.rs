//! Mock request repository for testing.

use super::MockUserRepository;
use crate::error::{RequestError, Result};
use crate::providers::{PageRequest, RequestRepository, SortOrder};
use crate::state::{Request, RequestId, Stage, UserId};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    requests: BTreeMap<RequestId, Request>,
}

/// Mock request repository backed by in-memory storage.
///
/// Holds a handle to a [`MockUserRepository`] so the owner-name search
/// can perform the same join the PostgreSQL store does.
#[derive(Debug, Clone, Default)]
pub struct MockRequestRepository {
    inner: Arc<Mutex<Inner>>,
    users: MockUserRepository,
}

impl MockRequestRepository {
    /// Create an empty mock repository with a detached user store.
    /// Use [`Self::with_users`] when the owner-name search matters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mock repository sharing `users` for name joins.
    #[must_use]
    pub fn with_users(users: &MockUserRepository) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            users: users.clone(),
        }
    }

    /// Seed a request in an arbitrary stage. Test helper.
    pub fn seed(
        &self,
        owner: UserId,
        created_at: NaiveDate,
        stage: Stage,
        description: &str,
    ) -> Request {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let request = Request {
            id: RequestId(inner.next_id),
            created_at,
            owner_user_id: owner,
            stage,
            description: description.to_string(),
        };
        inner.requests.insert(request.id, request.clone());
        request
    }

    /// Current stored state of one request. Test helper.
    #[must_use]
    pub fn get(&self, id: RequestId) -> Option<Request> {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        inner.requests.get(&id).cloned()
    }

    fn sorted_page(mut rows: Vec<Request>, order: SortOrder, page: PageRequest) -> Vec<Request> {
        rows.sort_by_key(|r| (r.created_at, r.id));
        if order == SortOrder::Descending {
            rows.reverse();
        }
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);
        rows.into_iter().skip(offset).take(limit).collect()
    }
}

impl RequestRepository for MockRequestRepository {
    fn find_by_id(&self, id: RequestId) -> impl Future<Output = Result<Request>> + Send {
        async move {
            let inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            inner
                .requests
                .get(&id)
                .cloned()
                .ok_or(RequestError::request_not_found(id))
        }
    }

    fn insert(
        &self,
        owner: UserId,
        created_at: NaiveDate,
        description: &str,
    ) -> impl Future<Output = Result<Request>> + Send {
        async move { Ok(self.seed(owner, created_at, Stage::Draft, description)) }
    }

    fn update_description(
        &self,
        id: RequestId,
        description: &str,
    ) -> impl Future<Output = Result<Request>> + Send {
        async move {
            let mut inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let request = inner
                .requests
                .get_mut(&id)
                .ok_or(RequestError::request_not_found(id))?;
            request.description = description.to_string();
            Ok(request.clone())
        }
    }

    fn update_stage(
        &self,
        id: RequestId,
        from: Stage,
        to: Stage,
    ) -> impl Future<Output = Result<Option<Request>>> + Send {
        async move {
            // Single mutex guard covers the compare and the swap,
            // matching the single-row atomicity of the SQL store.
            let mut inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match inner.requests.get_mut(&id) {
                Some(request) if request.stage == from => {
                    request.stage = to;
                    Ok(Some(request.clone()))
                }
                _ => Ok(None),
            }
        }
    }

    fn list_by_owner(
        &self,
        owner: UserId,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send {
        async move {
            let rows = {
                let inner = self
                    .inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                inner
                    .requests
                    .values()
                    .filter(|r| r.owner_user_id == owner)
                    .cloned()
                    .collect()
            };
            Ok(Self::sorted_page(rows, order, page))
        }
    }

    fn list_by_stage(
        &self,
        stage: Stage,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send {
        async move {
            let rows = {
                let inner = self
                    .inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                inner
                    .requests
                    .values()
                    .filter(|r| r.stage == stage)
                    .cloned()
                    .collect()
            };
            Ok(Self::sorted_page(rows, order, page))
        }
    }

    fn list_by_owner_name(
        &self,
        name_part1: &str,
        name_part2: &str,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send {
        async move {
            let owner_ids = self.users.ids_matching_name(name_part1, name_part2);
            let rows = {
                let inner = self
                    .inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                inner
                    .requests
                    .values()
                    .filter(|r| owner_ids.contains(&r.owner_user_id))
                    .cloned()
                    .collect()
            };
            Ok(Self::sorted_page(rows, order, page))
        }
    }
}
