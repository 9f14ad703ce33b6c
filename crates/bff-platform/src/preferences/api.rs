//! Preferences API
//!
//! Pass-through to the preferences store for the calling user.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::client::PreferencesStore;
use super::entity::Preferences;
use crate::shared::authorization_service::{operations, AccessControl};
use crate::shared::error::{BffError, ProblemDetail};
use crate::shared::middleware::Caller;

/// Preferences service state
#[derive(Clone)]
pub struct PreferencesState {
    pub store: Arc<dyn PreferencesStore>,
    pub access: Arc<AccessControl>,
}

/// Get the caller's preferences
#[utoipa::path(
    get,
    path = "/preferences",
    tag = "preferences",
    responses(
        (status = 200, description = "Preferences of the caller", body = Preferences),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Preferences store failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_preferences(
    State(state): State<PreferencesState>,
    caller: Caller,
) -> Result<Json<Preferences>, BffError> {
    state.access.require(&caller, operations::PREFERENCES_GET).await?;
    let prefs = state.store.get(&caller).await?;
    Ok(Json(prefs))
}

/// Create the caller's preferences
#[utoipa::path(
    post,
    path = "/preferences",
    tag = "preferences",
    request_body = Preferences,
    responses(
        (status = 200, description = "Stored preferences", body = Preferences),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Preferences store failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_preferences(
    State(state): State<PreferencesState>,
    caller: Caller,
    body: Result<Json<Preferences>, JsonRejection>,
) -> Result<Json<Preferences>, BffError> {
    state.access.require(&caller, operations::PREFERENCES_CREATE).await?;
    let Json(req) = body?;
    let prefs = state.store.save(&caller, &req).await?;
    Ok(Json(prefs))
}

/// Replace the caller's preferences
#[utoipa::path(
    put,
    path = "/preferences",
    tag = "preferences",
    request_body = Preferences,
    responses(
        (status = 200, description = "Stored preferences", body = Preferences),
        (status = 403, description = "Access denied", body = ProblemDetail),
        (status = 502, description = "Preferences store failed", body = ProblemDetail)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_preferences(
    State(state): State<PreferencesState>,
    caller: Caller,
    body: Result<Json<Preferences>, JsonRejection>,
) -> Result<Json<Preferences>, BffError> {
    state.access.require(&caller, operations::PREFERENCES_UPDATE).await?;
    let Json(req) = body?;
    let prefs = state.store.update(&caller, &req).await?;
    Ok(Json(prefs))
}

/// Create preferences router
pub fn preferences_router(state: PreferencesState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_preferences, save_preferences, update_preferences))
        .with_state(state)
}
