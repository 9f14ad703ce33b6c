//! Users API
//!
//! REST endpoints for user accounts and their realm role mappings.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::entity::{CreateUserRequest, UpdatePasswordRequest, UpdateUserRequest, UserListResponse, UserResponse};
use super::service::UserDirectoryAggregator;
use crate::role::{Role, RoleListResponse};
use crate::shared::api_common::PaginationParams;
use crate::shared::authorization_service::{operations, AccessControl};
use crate::shared::error::{BffError, ProblemDetail};
use crate::shared::middleware::Caller;

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub aggregator: Arc<UserDirectoryAggregator>,
    pub access: Arc<AccessControl>,
}

/// Create a user
///
/// Every requested role must exist in the realm with the same id and name.
/// The new user must change the password on first login and is sent an
/// e-mail asking to do so.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ProblemDetail),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 404, description = "Requested roles not found in the realm", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<UsersState>,
    caller: Caller,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, BffError> {
    state.access.require(&caller, operations::USERS_CREATE).await?;
    let Json(req) = body?;
    let user = state.aggregator.create_user(&caller, req).await?;
    Ok(Json(user))
}

/// List users with their realm roles
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users", body = UserListResponse),
        (status = 400, description = "Invalid pagination", body = ProblemDetail),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<UsersState>,
    caller: Caller,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<UserListResponse>, BffError> {
    state.access.require(&caller, operations::USERS_LIST).await?;
    let page = state.aggregator.list_users(&caller, pagination).await?;
    Ok(Json(page))
}

/// Get a user with realm roles
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, BffError> {
    state.access.require(&caller, operations::USERS_GET).await?;
    let user = state.aggregator.get_user(&caller, &id).await?;
    Ok(Json(user))
}

/// Update e-mail, names and enabled flag
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 204, description = "User updated"),
        (status = 400, description = "Invalid request", body = ProblemDetail),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<StatusCode, BffError> {
    state.access.require(&caller, operations::USERS_UPDATE).await?;
    let Json(req) = body?;
    state.aggregator.update_user(&caller, &id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, BffError> {
    state.access.require(&caller, operations::USERS_DELETE).await?;
    state.aggregator.delete_user(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reset a user's password
#[utoipa::path(
    put,
    path = "/users/{id}/password",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Invalid request", body = ProblemDetail),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_password(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, BffError> {
    state.access.require(&caller, operations::USERS_PASSWORD_UPDATE).await?;
    let Json(req) = body?;
    state.aggregator.update_password(&caller, &id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Realm roles assigned to a user
#[utoipa::path(
    get,
    path = "/users/{id}/roles",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Assigned roles", body = RoleListResponse),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_assigned_roles(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<RoleListResponse>, BffError> {
    state.access.require(&caller, operations::USERS_ROLES_GET).await?;
    let roles = state.aggregator.list_assigned_roles(&caller, &id).await?;
    Ok(Json(roles))
}

/// Replace a user's realm roles
///
/// Current roles are removed before the new set is assigned.
#[utoipa::path(
    put,
    path = "/users/{id}/roles",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = Vec<Role>,
    responses(
        (status = 200, description = "Roles after the update", body = RoleListResponse),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_assigned_roles(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<Vec<Role>>, JsonRejection>,
) -> Result<Json<RoleListResponse>, BffError> {
    state.access.require(&caller, operations::USERS_ROLES_UPDATE).await?;
    let Json(roles) = body?;
    let roles = state.aggregator.update_assigned_roles(&caller, &id, roles).await?;
    Ok(Json(roles))
}

/// Realm roles a user does not hold yet
#[utoipa::path(
    get,
    path = "/users/{id}/roles/available",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Assignable roles", body = RoleListResponse),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_available_roles(
    State(state): State<UsersState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<RoleListResponse>, BffError> {
    state.access.require(&caller, operations::USERS_ROLES_GET).await?;
    let roles = state.aggregator.list_available_roles(&caller, &id).await?;
    Ok(Json(roles))
}

/// Create users router
pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_user, list_users))
        .routes(routes!(get_user, update_user, delete_user))
        .routes(routes!(update_password))
        .routes(routes!(list_assigned_roles, update_assigned_roles))
        .routes(routes!(list_available_roles))
        .with_state(state)
}
