//! Query and formatting layer.
//!
//! Pagination, sort-direction mapping, name-based search tokenization,
//! and role-conditional output shaping for request views. Reads load
//! the request first and then resolve its owner by id; there is no
//! implicit lazy fetching.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::PaginationConfig;
use crate::error::Result;
use crate::providers::{PageRequest, RequestRepository, SortOrder, UserRepository};
use crate::state::{CallerIdentity, Request, RequestId, Stage, User, UserId};

/// Caller-facing projection of a [`Request`], with its owner resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    /// Request id.
    pub request_id: RequestId,
    /// Creation date.
    pub created_at: chrono::NaiveDate,
    /// Owner's user id.
    pub owner_user_id: UserId,
    /// Owner's given name.
    pub owner_name: String,
    /// Owner's family name.
    pub owner_surname: String,
    /// Stage token (`"DRAFT"`, `"SUBMITTED"`, ...).
    pub stage: String,
    /// Description; redacted on operator surfaces.
    pub description: String,
}

/// Map a caller-supplied sort parameter to a [`SortOrder`].
///
/// `"reverse"` (ASCII-case-insensitive) sorts newest first; any other
/// value, including `"default"` and unrecognized strings, silently
/// sorts oldest first. This permissive handling is deliberate contract.
#[must_use]
pub fn sort_order(param: &str) -> SortOrder {
    if param.eq_ignore_ascii_case("reverse") {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    }
}

/// Redact a description for operator display: interleave a hyphen
/// between every character, with no trailing hyphen.
///
/// `"abc"` becomes `"a-b-c"`, `"x"` stays `"x"`, and the empty string
/// stays empty.
#[must_use]
pub fn redact(description: &str) -> String {
    let mut out = String::with_capacity(description.len() * 2);
    for (i, c) in description.chars().enumerate() {
        if i > 0 {
            out.push('-');
        }
        out.push(c);
    }
    out
}

/// Split a full-name query on the first space into two tokens.
///
/// With no space present the second token is the empty string, so a
/// single-token query matches only exact equality against name or
/// surname in that slot. This is literal behavior, not a fuzzy search;
/// tokens past the second are ignored.
pub(crate) fn split_full_name(query: &str) -> (&str, &str) {
    let mut parts = query.split(' ');
    let part1 = parts.next().unwrap_or("");
    let part2 = parts.next().unwrap_or("");
    (part1, part2)
}

/// The query/formatting layer over the store collaborators.
pub struct RequestQueries<R, U> {
    requests: R,
    users: U,
    pagination: PaginationConfig,
}

impl<R, U> RequestQueries<R, U>
where
    R: RequestRepository,
    U: UserRepository,
{
    /// Create a query layer with an explicit pagination configuration.
    pub const fn new(requests: R, users: U, pagination: PaginationConfig) -> Self {
        Self {
            requests,
            users,
            pagination,
        }
    }

    const fn page(&self, index: u32) -> PageRequest {
        PageRequest::new(index, self.pagination.page_size)
    }

    /// Requests owned by `owner`, any stage, one page.
    ///
    /// Descriptions are not redacted: this is the owner's own surface.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or an owner fails to resolve.
    pub async fn list_by_owner(
        &self,
        owner: UserId,
        sort: &str,
        page_index: u32,
    ) -> Result<Vec<RequestView>> {
        let requests = self
            .requests
            .list_by_owner(owner, sort_order(sort), self.page(page_index))
            .await?;
        self.to_views(requests, false).await
    }

    /// The operator queue: requests in `Submitted`, one page,
    /// descriptions redacted.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or an owner fails to resolve.
    pub async fn operator_queue(&self, sort: &str, page_index: u32) -> Result<Vec<RequestView>> {
        let requests = self
            .requests
            .list_by_stage(Stage::Submitted, sort_order(sort), self.page(page_index))
            .await?;
        self.to_views(requests, true).await
    }

    /// Requests whose owner matches a full-name query, any stage, one
    /// page, descriptions redacted (operator surface).
    ///
    /// The query is split on the first space; the two tokens must equal
    /// the owner's name and surname in either order.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or an owner fails to resolve.
    pub async fn search_by_name(
        &self,
        query: &str,
        sort: &str,
        page_index: u32,
    ) -> Result<Vec<RequestView>> {
        let (part1, part2) = split_full_name(query);
        let requests = self
            .requests
            .list_by_owner_name(part1, part2, sort_order(sort), self.page(page_index))
            .await?;
        self.to_views(requests, true).await
    }

    /// A single request by id, shaped for `caller`.
    ///
    /// The description is redacted exactly when the caller's capability
    /// set contains Operator: operator authority takes precedence over
    /// plain-user authority, and never applies otherwise.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the request does not exist
    /// - `Database` / `NotFound` if the owner fails to resolve
    pub async fn get_by_id(
        &self,
        id: RequestId,
        caller: &CallerIdentity,
    ) -> Result<RequestView> {
        let request = self.requests.find_by_id(id).await?;
        self.render(&request, caller.is_operator()).await
    }

    /// Shape one request into a view, resolving its owner by id.
    ///
    /// # Errors
    ///
    /// Returns error if the owner fails to resolve.
    pub async fn render(&self, request: &Request, redacted: bool) -> Result<RequestView> {
        let owner = self.users.find_by_id(request.owner_user_id).await?;
        Ok(Self::view(request, &owner, redacted))
    }

    async fn to_views(&self, requests: Vec<Request>, redacted: bool) -> Result<Vec<RequestView>> {
        // One page shares few distinct owners; resolve each only once.
        let mut owners: HashMap<UserId, User> = HashMap::new();
        let mut views = Vec::with_capacity(requests.len());

        for request in &requests {
            if !owners.contains_key(&request.owner_user_id) {
                let owner = self.users.find_by_id(request.owner_user_id).await?;
                owners.insert(request.owner_user_id, owner);
            }
            let owner = &owners[&request.owner_user_id];
            views.push(Self::view(request, owner, redacted));
        }

        Ok(views)
    }

    fn view(request: &Request, owner: &User, redacted: bool) -> RequestView {
        RequestView {
            request_id: request.id,
            created_at: request.created_at,
            owner_user_id: request.owner_user_id,
            owner_name: owner.name.clone(),
            owner_surname: owner.surname.clone(),
            stage: request.stage.as_str().to_string(),
            description: if redacted {
                redact(&request.description)
            } else {
                request.description.clone()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{MockRequestRepository, MockUserRepository};
    use crate::state::Role;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn queries(
        requests: &MockRequestRepository,
        users: &MockUserRepository,
    ) -> RequestQueries<MockRequestRepository, MockUserRepository> {
        RequestQueries::new(requests.clone(), users.clone(), PaginationConfig::default())
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("abc"), "a-b-c");
        assert_eq!(redact("x"), "x");
        assert_eq!(redact(""), "");
        assert_eq!(redact("ab"), "a-b");
    }

    #[test]
    fn test_sort_order_mapping() {
        assert_eq!(sort_order("reverse"), SortOrder::Descending);
        assert_eq!(sort_order("REVERSE"), SortOrder::Descending);
        assert_eq!(sort_order("default"), SortOrder::Ascending);
        assert_eq!(sort_order(""), SortOrder::Ascending);
        assert_eq!(sort_order("garbage"), SortOrder::Ascending);
    }

    #[test]
    fn test_split_full_name() {
        assert_eq!(split_full_name("Ann Lee"), ("Ann", "Lee"));
        assert_eq!(split_full_name("Ann"), ("Ann", ""));
        assert_eq!(split_full_name(""), ("", ""));
        // Tokens past the second are ignored.
        assert_eq!(split_full_name("Ann Lee Smith"), ("Ann", "Lee"));
    }

    #[tokio::test]
    async fn test_list_by_owner_sort_and_paging() {
        let users = MockUserRepository::new();
        let requests = MockRequestRepository::with_users(&users);
        let owner = users.add_user("ann", "Ann", "Lee", [Role::User]);
        for day in 1..=7 {
            requests.seed(owner.id, date(2024, 5, day), Stage::Draft, "d");
        }

        let queries = queries(&requests, &users);

        let first_page = queries.list_by_owner(owner.id, "default", 0).await.unwrap();
        assert_eq!(first_page.len(), 5);
        assert!(first_page
            .windows(2)
            .all(|w| w[0].created_at <= w[1].created_at));

        let second_page = queries.list_by_owner(owner.id, "default", 1).await.unwrap();
        assert_eq!(second_page.len(), 2);

        let reversed = queries.list_by_owner(owner.id, "reverse", 0).await.unwrap();
        assert!(reversed
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(reversed[0].created_at, date(2024, 5, 7));
    }

    #[tokio::test]
    async fn test_owner_surface_is_not_redacted() {
        let users = MockUserRepository::new();
        let requests = MockRequestRepository::with_users(&users);
        let owner = users.add_user("ann", "Ann", "Lee", [Role::User]);
        requests.seed(owner.id, date(2024, 5, 1), Stage::Submitted, "abc");

        let queries = queries(&requests, &users);
        let views = queries.list_by_owner(owner.id, "default", 0).await.unwrap();

        assert_eq!(views[0].description, "abc");
        assert_eq!(views[0].owner_name, "Ann");
        assert_eq!(views[0].owner_surname, "Lee");
    }

    #[tokio::test]
    async fn test_operator_queue_is_submitted_only_and_redacted() {
        let users = MockUserRepository::new();
        let requests = MockRequestRepository::with_users(&users);
        let owner = users.add_user("ann", "Ann", "Lee", [Role::User]);
        requests.seed(owner.id, date(2024, 5, 1), Stage::Draft, "draft");
        let submitted = requests.seed(owner.id, date(2024, 5, 2), Stage::Submitted, "abc");
        requests.seed(owner.id, date(2024, 5, 3), Stage::Approved, "done");

        let queries = queries(&requests, &users);
        let views = queries.operator_queue("default", 0).await.unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].request_id, submitted.id);
        assert_eq!(views[0].stage, "SUBMITTED");
        assert_eq!(views[0].description, "a-b-c");
    }

    #[tokio::test]
    async fn test_search_by_name_matches_either_order() {
        let users = MockUserRepository::new();
        let requests = MockRequestRepository::with_users(&users);
        let ann = users.add_user("ann", "Ann", "Lee", [Role::User]);
        let bob = users.add_user("bob", "Bob", "Ann", [Role::User]);
        let mononym = users.add_user("cher", "Ann", "", [Role::User]);
        requests.seed(ann.id, date(2024, 5, 1), Stage::Draft, "abc");
        requests.seed(bob.id, date(2024, 5, 2), Stage::Draft, "xyz");
        requests.seed(mononym.id, date(2024, 5, 3), Stage::Draft, "solo");

        let queries = queries(&requests, &users);

        let by_full = queries.search_by_name("Ann Lee", "default", 0).await.unwrap();
        assert_eq!(by_full.len(), 1);
        assert_eq!(by_full[0].owner_user_id, ann.id);

        let by_reversed = queries.search_by_name("Lee Ann", "default", 0).await.unwrap();
        assert_eq!(by_reversed.len(), 1);
        assert_eq!(by_reversed[0].owner_user_id, ann.id);

        // Single token pairs with an empty second token, so it only
        // matches when the other field is empty too: "Ann" finds the
        // mononym, not Ann Lee or Bob Ann.
        let by_single = queries.search_by_name("Ann", "default", 0).await.unwrap();
        assert_eq!(by_single.len(), 1);
        assert_eq!(by_single[0].owner_user_id, mononym.id);

        // Not a substring search.
        let none = queries.search_by_name("An", "default", 0).await.unwrap();
        assert!(none.is_empty());

        // Search is an operator surface: redacted.
        assert_eq!(by_full[0].description, "a-b-c");
    }

    #[tokio::test]
    async fn test_get_by_id_redacts_iff_operator() {
        let users = MockUserRepository::new();
        let requests = MockRequestRepository::with_users(&users);
        let owner = users.add_user("ann", "Ann", "Lee", [Role::User]);
        let request = requests.seed(owner.id, date(2024, 5, 1), Stage::Submitted, "abc");

        let queries = queries(&requests, &users);

        let plain = CallerIdentity::new(owner.id, [Role::User]);
        let view = queries.get_by_id(request.id, &plain).await.unwrap();
        assert_eq!(view.description, "abc");

        let operator = CallerIdentity::new(UserId(2), [Role::Operator]);
        let view = queries.get_by_id(request.id, &operator).await.unwrap();
        assert_eq!(view.description, "a-b-c");

        // Operator takes precedence when both roles are held.
        let both = CallerIdentity::new(UserId(2), [Role::User, Role::Operator]);
        let view = queries.get_by_id(request.id, &both).await.unwrap();
        assert_eq!(view.description, "a-b-c");
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let users = MockUserRepository::new();
        let requests = MockRequestRepository::with_users(&users);
        let caller = CallerIdentity::new(UserId(1), [Role::User]);

        let queries = queries(&requests, &users);
        let err = queries.get_by_id(RequestId(404), &caller).await.unwrap_err();

        assert!(matches!(err, crate::RequestError::NotFound { .. }));
    }
}
