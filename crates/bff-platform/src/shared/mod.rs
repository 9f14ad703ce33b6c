//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod error;
pub mod middleware;
pub mod api_common;
pub mod downstream;
pub mod sorting;

// APIs
pub mod health_api;

// Services
pub mod authorization_service;

// Re-export commonly used items
pub use error::{BffError, DownstreamProblem, ProblemDetail, Result};
pub use middleware::{Caller, RequestContextLayer};
pub use api_common::PaginationParams;
pub use downstream::{build_http_client, Credentials, DownstreamClient};
pub use health_api::health_router;
pub use authorization_service::{operations, AccessControl};
