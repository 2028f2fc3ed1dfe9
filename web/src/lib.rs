//! Axum web framework glue for the request approval service.
//!
//! This crate bridges domain errors and HTTP, and carries the
//! cross-cutting HTTP concerns the service handlers share:
//!
//! - [`AppError`]: domain-error-to-HTTP-response bridge with a JSON
//!   `{statusCode, message}` body.
//! - [`CorrelationId`]: per-request correlation id extractor.
//! - [`correlation_id_layer`]: middleware that threads correlation ids
//!   through spans and response headers.
//!
//! # Request Flow
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extract** caller identity, correlation id, JSON body
//! 3. **Call** the domain layer (lifecycle engine or query layer)
//! 4. **Map** the result to a response, or the error to an [`AppError`]

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
