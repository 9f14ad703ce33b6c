//! Actions API

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use std::sync::Arc;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::client::ActionHistoryLog;
use super::entity::{ActionListResponse, ActionResponse, ActionsQuery, CreateActionRequest};
use crate::shared::authorization_service::{operations, AccessControl};
use crate::shared::error::{BffError, ProblemDetail};
use crate::shared::middleware::Caller;

/// Actions service state
#[derive(Clone)]
pub struct ActionsState {
    pub history: Arc<dyn ActionHistoryLog>,
    pub access: Arc<AccessControl>,
}

/// Record an action for a user
#[utoipa::path(
    post,
    path = "/actions/{userId}",
    tag = "actions",
    params(
        ("userId" = String, Path, description = "User id")
    ),
    request_body = CreateActionRequest,
    responses(
        (status = 200, description = "Action recorded", body = ActionResponse),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "History log failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_action(
    State(state): State<ActionsState>,
    caller: Caller,
    Path(user_id): Path<String>,
    body: Result<Json<CreateActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, BffError> {
    state.access.require(&caller, operations::ACTIONS_CREATE).await?;
    let Json(req) = body?;
    let action = state.history.create_action(&caller, &user_id, &req).await?;
    Ok(Json(action))
}

/// Actions of one user
#[utoipa::path(
    get,
    path = "/actions/{userId}",
    tag = "actions",
    params(
        ("userId" = String, Path, description = "User id"),
        ActionsQuery
    ),
    responses(
        (status = 200, description = "Page of actions", body = ActionListResponse),
        (status = 400, description = "Invalid pagination", body = ProblemDetail),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "History log failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_actions(
    State(state): State<ActionsState>,
    caller: Caller,
    Path(user_id): Path<String>,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<ActionListResponse>, BffError> {
    state.access.require(&caller, operations::ACTIONS_GET).await?;
    let query = query.validated()?;
    let actions = state.history.get_actions(&caller, &user_id, &query).await?;
    Ok(Json(actions))
}

/// Actions of all users
#[utoipa::path(
    get,
    path = "/actions",
    tag = "actions",
    params(ActionsQuery),
    responses(
        (status = 200, description = "Page of actions", body = ActionListResponse),
        (status = 400, description = "Invalid pagination", body = ProblemDetail),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "History log failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_actions(
    State(state): State<ActionsState>,
    caller: Caller,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<ActionListResponse>, BffError> {
    state.access.require(&caller, operations::ACTIONS_LIST).await?;
    let query = query.validated()?;
    let actions = state.history.list_actions(&caller, &query).await?;
    Ok(Json(actions))
}

/// Create actions router
pub fn actions_router(state: ActionsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_actions))
        .routes(routes!(create_action, get_actions))
        .with_state(state)
}
