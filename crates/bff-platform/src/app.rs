//! Application assembly
//!
//! Wires downstream clients, access control and the routers into one axum
//! app plus its OpenAPI document.

use axum::{http::Uri, Router};
use bff_config::AppConfig;
use std::sync::Arc;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;

use crate::actions::{actions_router, ActionHistoryLog, ActionsState, HistoryClient};
use crate::idp::{IdentityDirectory, KeycloakDirectory};
use crate::preferences::{preferences_router, PreferencesClient, PreferencesState, PreferencesStore};
use crate::role::{roles_router, RolesState};
use crate::shared::authorization_service::AccessControl;
use crate::shared::downstream::build_http_client;
use crate::shared::error::{BffError, Result};
use crate::shared::health_api::health_router;
use crate::shared::middleware::RequestContextLayer;
use crate::user::{users_router, UserDirectoryAggregator, UsersState};

/// Downstream capabilities and access control backing the routers
#[derive(Clone)]
pub struct BffServices {
    pub directory: Arc<dyn IdentityDirectory>,
    pub preferences: Arc<dyn PreferencesStore>,
    pub history: Arc<dyn ActionHistoryLog>,
    pub access: Arc<AccessControl>,
}

impl BffServices {
    /// Production services: Keycloak, the preferences store and the history
    /// log over one shared HTTP client
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = build_http_client(&config.downstream)?;

        let directory = KeycloakDirectory::from_config(&config.keycloak, http.clone());
        let preferences = PreferencesClient::new(http.clone(), config.downstream.preferences_url.clone());
        let history = HistoryClient::new(http.clone(), config.downstream.history_url.clone());
        let access = AccessControl::new(&config.rbac, &config.keycloak, http)?;

        info!(
            keycloak = %config.keycloak.admin_base_url(),
            preferences = %config.downstream.preferences_url,
            history = %config.downstream.history_url,
            rbac = ?config.rbac.mode,
            "Downstream clients configured"
        );

        Ok(Self {
            directory: Arc::new(directory),
            preferences: Arc::new(preferences),
            history: Arc::new(history),
            access: Arc::new(access),
        })
    }
}

/// Build the API router and its OpenAPI document.
///
/// Every route, and the fallback for unknown paths, runs behind
/// [`RequestContextLayer`], so each response carries `X-Request-Id`.
/// Routers merged in later (Swagger UI) need the layer applied themselves.
pub fn build_app(services: BffServices) -> (Router, utoipa::openapi::OpenApi) {
    let aggregator = Arc::new(UserDirectoryAggregator::new(services.directory));

    let users_state = UsersState {
        aggregator: aggregator.clone(),
        access: services.access.clone(),
    };
    let roles_state = RolesState {
        aggregator,
        access: services.access.clone(),
    };
    let preferences_state = PreferencesState {
        store: services.preferences,
        access: services.access.clone(),
    };
    let actions_state = ActionsState {
        history: services.history,
        access: services.access,
    };

    let (router, openapi) = OpenApiRouter::new()
        .merge(users_router(users_state))
        .merge(roles_router(roles_state))
        .merge(preferences_router(preferences_state))
        .merge(actions_router(actions_state))
        .merge(health_router())
        .split_for_parts();

    let router = router
        .fallback(route_not_found)
        .layer(RequestContextLayer::new());

    (router, openapi)
}

async fn route_not_found(uri: Uri) -> BffError {
    BffError::RouteNotFound {
        path: uri.path().to_string(),
    }
}
