//! User Aggregate
//!
//! User accounts joined with their realm role mappings.

pub mod entity;
pub mod roles;
pub mod service;
pub mod api;

pub use entity::{CreateUserRequest, UpdatePasswordRequest, UpdateUserRequest, UserListResponse, UserResponse};
pub use service::UserDirectoryAggregator;
pub use api::{UsersState, users_router};
