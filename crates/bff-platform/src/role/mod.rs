//! Role Aggregate
//!
//! Realm role listing. Role assignment lives with the user aggregate.

pub mod entity;
pub mod api;

pub use entity::{Role, RoleListResponse};
pub use api::{RolesState, roles_router};
