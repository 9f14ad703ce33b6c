//! Roles API

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::role::entity::RoleListResponse;
use crate::shared::authorization_service::{operations, AccessControl};
use crate::shared::error::{BffError, ProblemDetail};
use crate::shared::middleware::Caller;
use crate::user::UserDirectoryAggregator;

/// Query parameters for the role list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RolesQuery {
    /// Comma separated sort keys (`id`, `name`); prefix `-` for descending
    pub sort: Option<String>,
}

/// Roles service state
#[derive(Clone)]
pub struct RolesState {
    pub aggregator: Arc<UserDirectoryAggregator>,
    pub access: Arc<AccessControl>,
}

/// List realm roles
#[utoipa::path(
    get,
    path = "/roles",
    tag = "roles",
    params(RolesQuery),
    responses(
        (status = 200, description = "Realm roles", body = RoleListResponse),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Identity directory failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_roles(
    State(state): State<RolesState>,
    caller: Caller,
    Query(query): Query<RolesQuery>,
) -> Result<Json<RoleListResponse>, BffError> {
    state.access.require(&caller, operations::ROLE_LIST).await?;
    let roles = state
        .aggregator
        .list_realm_roles(&caller, query.sort.as_deref())
        .await?;
    Ok(Json(roles))
}

/// Create roles router
pub fn roles_router(state: RolesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_roles))
        .with_state(state)
}
