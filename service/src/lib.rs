//! # Request Approval Workflow Service
//!
//! This crate implements a request-approval workflow: users create and
//! submit requests, operators approve or reject them, and admins manage
//! user roles.
//!
//! ## Architecture
//!
//! The core is split into two collaborating layers over external
//! collaborators (a persistence store and an upstream identity provider):
//!
//! ```text
//! caller ──> identity (roles) ──> lifecycle engine ──> store
//!                                      │
//!                                 query layer ──> response shaping
//! ```
//!
//! - [`lifecycle::RequestLifecycle`]: the stage state machine
//!   (Draft → Submitted → Approved | Rejected) with ownership checks.
//! - [`query::RequestQueries`]: pagination, sorting, name search, and
//!   role-conditional description redaction.
//! - [`directory::UserDirectory`]: admin-facing user listing and
//!   operator promotion.
//! - [`providers`]: the traits the store and clock collaborators
//!   implement; [`stores`] holds the PostgreSQL implementations and
//!   [`mocks`] the in-memory ones.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod providers;
pub mod query;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

#[cfg(feature = "postgres")]
pub mod stores;

#[cfg(feature = "axum")]
pub mod handlers;
#[cfg(feature = "axum")]
pub mod router;

// Re-export main types for convenience
pub use config::PaginationConfig;
pub use error::{RequestError, Result};
pub use state::{CallerIdentity, Request, RequestId, Role, Stage, User, UserId};
