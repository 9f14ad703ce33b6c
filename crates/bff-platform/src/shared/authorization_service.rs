//! Authorization Service
//!
//! Endpoint access control. Three modes:
//! - `disabled`: everything is allowed
//! - `id-token`: the `roles` claim of the caller's `X-Auth-Identity` token
//!   must intersect the roles configured for the operation
//! - `uma`: Keycloak decides per `path#METHOD` through a UMA ticket request

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bff_common::RequestContext;
use bff_config::{KeycloakConfig, RbacConfig, RbacMode};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::shared::error::{BffError, Result};

/// Operation keys used in the `access_control` map
pub mod operations {
    pub const USERS_CREATE: &str = "USERS_CREATE";
    pub const USERS_GET: &str = "USERS_GET";
    pub const USERS_LIST: &str = "USERS_LIST";
    pub const USERS_UPDATE: &str = "USERS_UPDATE";
    pub const USERS_DELETE: &str = "USERS_DELETE";
    pub const USERS_PASSWORD_UPDATE: &str = "USERS_PASSWORD_UPDATE";
    pub const USERS_ROLES_GET: &str = "USERS_ROLES_GET";
    pub const USERS_ROLES_UPDATE: &str = "USERS_ROLES_UPDATE";
    pub const ROLE_LIST: &str = "ROLE_LIST";
    pub const PREFERENCES_GET: &str = "PREFERENCES_GET";
    pub const PREFERENCES_CREATE: &str = "PREFERENCES_CREATE";
    pub const PREFERENCES_UPDATE: &str = "PREFERENCES_UPDATE";
    pub const ACTIONS_CREATE: &str = "ACTIONS_CREATE";
    pub const ACTIONS_GET: &str = "ACTIONS_GET";
    pub const ACTIONS_LIST: &str = "ACTIONS_LIST";
}

const ROLES_CLAIM: &str = "roles";
const UMA_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:uma-ticket";

/// Access decisions for inbound requests
pub struct AccessControl {
    mode: RbacMode,
    excluded: Vec<Regex>,
    access_control: HashMap<String, HashSet<String>>,
    uma: Option<UmaDecider>,
}

struct UmaDecider {
    http: reqwest::Client,
    token_url: String,
    audience: String,
}

#[derive(Debug, Deserialize)]
struct UmaDecision {
    #[serde(default)]
    result: bool,
}

impl AccessControl {
    pub fn new(rbac: &RbacConfig, keycloak: &KeycloakConfig, http: reqwest::Client) -> Result<Self> {
        let excluded = rbac
            .endpoints_excluded
            .iter()
            .map(|pattern| path_pattern(pattern))
            .collect::<Result<Vec<_>>>()?;

        let access_control = rbac
            .access_control
            .iter()
            .map(|(op, roles)| (op.clone(), roles.iter().cloned().collect()))
            .collect();

        let uma = (rbac.mode == RbacMode::Uma).then(|| UmaDecider {
            http,
            token_url: keycloak.token_url(),
            audience: keycloak.client_id.clone(),
        });

        Ok(Self {
            mode: rbac.mode,
            excluded,
            access_control,
            uma,
        })
    }

    /// Allow everything
    pub fn disabled() -> Self {
        Self {
            mode: RbacMode::Disabled,
            excluded: Vec::new(),
            access_control: HashMap::new(),
            uma: None,
        }
    }

    pub fn mode(&self) -> RbacMode {
        self.mode
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded.iter().any(|re| re.is_match(path))
    }

    /// Fail with 403 unless the caller may perform `operation`
    pub async fn require(&self, ctx: &RequestContext, operation: &str) -> Result<()> {
        if self.mode == RbacMode::Disabled || self.is_excluded(&ctx.path) {
            return Ok(());
        }

        let allowed = match self.mode {
            RbacMode::Disabled => true,
            RbacMode::IdToken => self.id_token_allows(ctx, operation),
            RbacMode::Uma => self.uma_allows(ctx).await,
        };

        if allowed {
            Ok(())
        } else {
            debug!(request_id = %ctx.request_id, operation, mode = ?self.mode, "Access denied");
            Err(BffError::forbidden(format!("Access to {} denied", operation)))
        }
    }

    fn id_token_allows(&self, ctx: &RequestContext, operation: &str) -> bool {
        let Some(allowed_roles) = self.access_control.get(operation) else {
            warn!(operation, "No access control entry for operation");
            return false;
        };
        let Some(token) = ctx.identity_token() else {
            return false;
        };
        match roles_from_id_token(token) {
            Some(roles) => roles.iter().any(|r| allowed_roles.contains(r)),
            None => false,
        }
    }

    async fn uma_allows(&self, ctx: &RequestContext) -> bool {
        let (Some(uma), Some(authorization)) = (&self.uma, ctx.authorization.as_deref()) else {
            return false;
        };

        let permission = format!("{}#{}", ctx.path, ctx.method);
        let form = [
            ("grant_type", UMA_GRANT_TYPE),
            ("audience", uma.audience.as_str()),
            ("permission_resource_format", "uri"),
            ("permission_resource_matching_uri", "true"),
            ("permission", permission.as_str()),
            ("response_mode", "decision"),
        ];

        let response = uma
            .http
            .post(&uma.token_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(bff_common::X_REQUEST_ID, &ctx.request_id)
            .form(&form)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => resp
                .json::<UmaDecision>()
                .await
                .map(|d| d.result)
                .unwrap_or(false),
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), %permission, "UMA decision refused");
                false
            }
            Err(e) => {
                warn!(error = %e, %permission, "UMA decision request failed");
                false
            }
        }
    }
}

/// Compile an exclusion pattern: `**` matches anything, `*` one path segment.
fn path_pattern(pattern: &str) -> Result<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*");
    Regex::new(&format!("^{}$", escaped))
        .map_err(|e| BffError::internal(format!("Invalid excluded endpoint '{}': {}", pattern, e)))
}

/// Read the `roles` claim from an unverified JWT payload.
///
/// The gateway in front of the BFF has already verified the token.
pub fn roles_from_id_token(token: &str) -> Option<Vec<String>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;

    let roles = match claims.get(ROLES_CLAIM) {
        Some(serde_json::Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    };
    Some(roles)
}
