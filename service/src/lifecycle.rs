//! Request lifecycle engine.
//!
//! Enforces the stage state machine and its ownership checks:
//!
//! ```text
//! Draft ──submit (owner)──> Submitted ──approve (operator)──> Approved
//!                                │
//!                                └──────reject (operator)───> Rejected
//! ```
//!
//! `Approved` and `Rejected` are terminal. Every transition validates,
//! in order: request presence, ownership, the caller-asserted
//! current-stage token, and the stored stage. The persist itself is a
//! compare-and-swap on the stored stage, so two racing transitions on
//! one request can never both apply.

use metrics::counter;
use std::sync::Arc;

use crate::error::{RequestError, Result};
use crate::providers::{Clock, RequestRepository, UserRepository};
use crate::state::{Request, RequestId, Stage, UserId};

/// Owner-mismatch message; part of the caller-visible contract.
const OWNER_MISMATCH: &str = "User id does not match with request author's ID.";

/// The request lifecycle engine.
///
/// Generic over the store collaborators; see [`crate::stores`] for the
/// PostgreSQL implementations and [`crate::mocks`] for the in-memory
/// ones.
pub struct RequestLifecycle<R, U> {
    requests: R,
    users: U,
    clock: Arc<dyn Clock>,
}

impl<R, U> RequestLifecycle<R, U>
where
    R: RequestRepository,
    U: UserRepository,
{
    /// Create a lifecycle engine over the given collaborators.
    pub fn new(requests: R, users: U, clock: Arc<dyn Clock>) -> Self {
        Self {
            requests,
            users,
            clock,
        }
    }

    /// Create a new request in `Draft` for `owner`.
    ///
    /// The stage is always `Draft` and the creation date always comes
    /// from the engine clock, regardless of caller input.
    ///
    /// # Errors
    ///
    /// - `IdentifierMismatch` if `owner` does not resolve
    /// - `Database` if the store fails
    pub async fn create(&self, owner: UserId, description: &str) -> Result<Request> {
        match self.users.find_by_id(owner).await {
            Ok(_) => {}
            Err(RequestError::NotFound { .. }) => {
                return Err(RequestError::IdentifierMismatch(format!(
                    "User with ID {owner} not found"
                )));
            }
            Err(e) => return Err(e),
        }

        let request = self
            .requests
            .insert(owner, self.clock.today(), description)
            .await?;

        counter!("requests_created_total").increment(1);
        tracing::info!(
            request_id = %request.id,
            owner_user_id = %owner,
            "Request created in Draft"
        );

        Ok(request)
    }

    /// Replace a request's description.
    ///
    /// No stage restriction is enforced: the owner may edit the
    /// description in any stage.
    ///
    /// # Errors
    ///
    /// - `IdentifierMismatch` if the request is missing or
    ///   `asserted_owner` is not its author
    /// - `Database` if the store fails
    pub async fn update_description(
        &self,
        id: RequestId,
        asserted_owner: UserId,
        description: &str,
    ) -> Result<Request> {
        let existing = match self.requests.find_by_id(id).await {
            Ok(request) => request,
            Err(RequestError::NotFound { .. }) => {
                return Err(RequestError::IdentifierMismatch(format!(
                    "Request with id {id} not found"
                )));
            }
            Err(e) => return Err(e),
        };

        if existing.owner_user_id != asserted_owner {
            return Err(RequestError::IdentifierMismatch(OWNER_MISMATCH.to_string()));
        }

        self.requests.update_description(id, description).await
    }

    /// Submit a draft to the operator queue: `Draft → Submitted`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`] for the validation order.
    pub async fn submit(
        &self,
        id: RequestId,
        asserted_owner: UserId,
        asserted_current_stage: &str,
    ) -> Result<Request> {
        self.transition(
            id,
            asserted_owner,
            asserted_current_stage,
            Stage::Draft,
            Stage::Submitted,
        )
        .await
    }

    /// Approve a submitted request: `Submitted → Approved`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`] for the validation order.
    pub async fn approve(
        &self,
        id: RequestId,
        asserted_owner: UserId,
        asserted_current_stage: &str,
    ) -> Result<Request> {
        self.transition(
            id,
            asserted_owner,
            asserted_current_stage,
            Stage::Submitted,
            Stage::Approved,
        )
        .await
    }

    /// Reject a submitted request: `Submitted → Rejected`.
    ///
    /// # Errors
    ///
    /// See [`Self::transition`] for the validation order.
    pub async fn reject(
        &self,
        id: RequestId,
        asserted_owner: UserId,
        asserted_current_stage: &str,
    ) -> Result<Request> {
        self.transition(
            id,
            asserted_owner,
            asserted_current_stage,
            Stage::Submitted,
            Stage::Rejected,
        )
        .await
    }

    /// Apply one transition as a single read-validate-write sequence.
    ///
    /// Validation order:
    ///
    /// 1. fetch by id — missing → `NotFound`
    /// 2. `asserted_owner` must equal the stored author →
    ///    `IdentifierMismatch` (always checked before any stage check)
    /// 3. the asserted current-stage token must equal `from` →
    ///    `StageTransition`
    /// 4. the stored stage must still equal `from` → `StageTransition`
    /// 5. compare-and-swap persist; a concurrent change surfaces as
    ///    `StageTransition` with no mutation applied
    ///
    /// # Errors
    ///
    /// `NotFound`, `IdentifierMismatch`, `StageTransition`, or
    /// `Database` as above.
    async fn transition(
        &self,
        id: RequestId,
        asserted_owner: UserId,
        asserted_current_stage: &str,
        from: Stage,
        to: Stage,
    ) -> Result<Request> {
        let existing = self.requests.find_by_id(id).await?;

        if existing.owner_user_id != asserted_owner {
            counter!("request_transitions_denied_total", "reason" => "owner_mismatch")
                .increment(1);
            return Err(RequestError::IdentifierMismatch(OWNER_MISMATCH.to_string()));
        }

        if asserted_current_stage != from.as_str() {
            counter!("request_transitions_denied_total", "reason" => "stage_token")
                .increment(1);
            return Err(RequestError::StageTransition(
                asserted_current_stage.to_string(),
            ));
        }

        if existing.stage != from {
            counter!("request_transitions_denied_total", "reason" => "stale_stage")
                .increment(1);
            tracing::debug!(
                request_id = %id,
                stored = %existing.stage,
                asserted = asserted_current_stage,
                "Stage token is stale, transition denied"
            );
            return Err(RequestError::StageTransition(
                existing.stage.as_str().to_string(),
            ));
        }

        let updated = self
            .requests
            .update_stage(id, from, to)
            .await?
            .ok_or_else(|| {
                // Lost the race: another call moved the stage between
                // our read and the compare-and-swap.
                counter!("request_transitions_denied_total", "reason" => "conflict")
                    .increment(1);
                RequestError::StageTransition(from.as_str().to_string())
            })?;

        counter!("request_stage_transitions_total", "to" => to.as_str()).increment(1);
        tracing::info!(
            request_id = %id,
            from = %from,
            to = %to,
            "Request stage transition applied"
        );

        Ok(updated)
    }
}
