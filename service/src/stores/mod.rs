//! Store implementations for the repository traits.

pub mod postgres;

pub use postgres::{PostgresRequestRepository, PostgresUserRepository};
