//! Core state types for the request approval workflow.
//!
//! All types are `Clone` so the engine and query layers can hand out
//! owned snapshots without aliasing the store's records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a request (store-generated sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique identifier for a user (store-generated sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Lifecycle Stage
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle stage of a request.
///
/// Transitions are monotonic along one of two paths from [`Stage::Draft`]:
/// `Draft → Submitted → Approved` or `Draft → Submitted → Rejected`.
/// `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Being edited by its owner; not yet visible to operators.
    Draft,
    /// Sent to the operator queue, awaiting a decision.
    Submitted,
    /// Accepted by an operator. Terminal.
    Approved,
    /// Declined by an operator. Terminal.
    Rejected,
}

impl Stage {
    /// Wire token for this stage; also the token callers assert when
    /// requesting a transition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parse a wire token. Exact match only; tokens are case-sensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns `true` for stages no transition may leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Roles
// ═══════════════════════════════════════════════════════════════════════

/// Authority a caller can hold. A caller holds a set of roles; the set
/// only ever grows (promotion), never shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// May create, edit, and submit their own requests.
    User,
    /// May approve/reject submitted requests and sees redacted
    /// descriptions.
    Operator,
    /// May list users and promote them to operator.
    Admin,
}

impl Role {
    /// Wire token for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Operator => "OPERATOR",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse a wire token. Exact match only.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "USER" => Some(Self::User),
            "OPERATOR" => Some(Self::Operator),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════════════════

/// A workflow request.
///
/// `owner_user_id` references the creating [`User`] and is immutable
/// after creation. Requests are never deleted by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier.
    pub id: RequestId,
    /// Creation date (the engine clock's calendar date).
    pub created_at: NaiveDate,
    /// The user who created this request.
    pub owner_user_id: UserId,
    /// Current lifecycle stage.
    pub stage: Stage,
    /// Free-form description, editable by the owner.
    pub description: String,
}

/// A user known to the service. Users are created externally; this
/// service only reads them and grows their role sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Unique login name.
    pub login: String,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Ordered capability set. Grows by promotion, never shrinks.
    pub roles: BTreeSet<Role>,
}

// ═══════════════════════════════════════════════════════════════════════
// Caller Identity
// ═══════════════════════════════════════════════════════════════════════

/// The resolved caller for one call: an id and an ordered capability
/// set, supplied by the upstream identity provider.
///
/// The engine and query layers only ever ask whether the set contains a
/// role; they never inspect raw authentication material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's user id.
    pub user_id: UserId,
    /// The caller's resolved roles.
    pub roles: BTreeSet<Role>,
}

impl CallerIdentity {
    /// Create an identity from an id and roles.
    #[must_use]
    pub fn new(user_id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id,
            roles: roles.into_iter().collect(),
        }
    }

    /// Whether the capability set contains `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether the caller holds operator authority. When a caller holds
    /// both operator and plain-user authority, operator takes
    /// precedence for read formatting.
    #[must_use]
    pub fn is_operator(&self) -> bool {
        self.has_role(Role::Operator)
    }
}
