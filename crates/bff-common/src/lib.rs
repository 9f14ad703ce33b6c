//! Portal BFF Common Types
//!
//! Shared primitives used by every BFF crate: correlation headers,
//! downstream attribution and the per-request context.

pub mod logging;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Correlation header, mirrored on every response and forwarded downstream.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header carrying the caller's ID token (optionally prefixed with `Bearer `).
pub const X_AUTH_IDENTITY: &str = "x-auth-identity";

/// Downstream system an error or call is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownstreamSystem {
    Keycloak,
    Preferences,
    History,
}

impl DownstreamSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownstreamSystem::Keycloak => "KEYCLOAK",
            DownstreamSystem::Preferences => "PREFERENCES",
            DownstreamSystem::History => "HISTORY",
        }
    }
}

impl std::fmt::Display for DownstreamSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request data threaded through every downstream call.
///
/// Built once per inbound request by the request-context middleware and
/// cloned into each client call. Carries no mutable state.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Correlation id (`X-Request-Id`)
    pub request_id: String,
    /// Raw `Authorization` header value of the caller
    pub authorization: Option<String>,
    /// Raw `X-Auth-Identity` header value of the caller
    pub identity: Option<String>,
    pub method: String,
    pub path: String,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }

    /// Context with a freshly generated correlation id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.authorization = Some(authorization.into());
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_route(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = method.into();
        self.path = path.into();
        self
    }

    /// The identity token with any `Bearer ` prefix removed.
    pub fn identity_token(&self) -> Option<&str> {
        self.identity
            .as_deref()
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
            .filter(|v| !v.is_empty())
    }
}
