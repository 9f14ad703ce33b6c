//! Identity Directory
//!
//! Capability interface over the identity provider's admin API: user CRUD,
//! realm roles, role mappings, password reset and required-action e-mails.
//! [`keycloak::KeycloakDirectory`] is the production implementation.

pub mod keycloak;
pub mod service_token;

use async_trait::async_trait;
use bff_common::RequestContext;
use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::shared::error::Result;

pub use keycloak::KeycloakDirectory;
pub use service_token::ServiceTokenProvider;

/// User record as stored by the identity directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_actions: Vec<RequiredAction>,
}

/// Steps a user must complete on next login
///
/// Realms can register their own actions, so anything unrecognised is kept
/// verbatim in `Other` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequiredAction {
    UpdatePassword,
    VerifyEmail,
    UpdateProfile,
    ConfigureTotp,
    TermsAndConditions,
    Other(String),
}

impl RequiredAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UpdatePassword => "UPDATE_PASSWORD",
            Self::VerifyEmail => "VERIFY_EMAIL",
            Self::UpdateProfile => "UPDATE_PROFILE",
            Self::ConfigureTotp => "CONFIGURE_TOTP",
            Self::TermsAndConditions => "TERMS_AND_CONDITIONS",
            Self::Other(action) => action,
        }
    }
}

impl From<String> for RequiredAction {
    fn from(action: String) -> Self {
        match action.as_str() {
            "UPDATE_PASSWORD" => Self::UpdatePassword,
            "VERIFY_EMAIL" => Self::VerifyEmail,
            "UPDATE_PROFILE" => Self::UpdateProfile,
            "CONFIGURE_TOTP" => Self::ConfigureTotp,
            "TERMS_AND_CONDITIONS" => Self::TermsAndConditions,
            _ => Self::Other(action),
        }
    }
}

impl From<RequiredAction> for String {
    fn from(action: RequiredAction) -> Self {
        match action {
            RequiredAction::Other(action) => action,
            known => known.as_str().to_string(),
        }
    }
}

/// Password credential for a reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCredential {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl PasswordCredential {
    pub fn new(value: impl Into<String>, temporary: bool) -> Self {
        Self {
            credential_type: "password".to_string(),
            value: value.into(),
            temporary,
        }
    }
}

/// Identity directory operations.
///
/// Every call is a single downstream request; composition happens in
/// [`crate::user::UserDirectoryAggregator`].
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Create a user; returns the location reference of the new record
    async fn create_user(&self, ctx: &RequestContext, user: &DirectoryUser) -> Result<String>;

    async fn get_user(&self, ctx: &RequestContext, user_id: &str) -> Result<DirectoryUser>;

    async fn update_user(&self, ctx: &RequestContext, user_id: &str, user: &DirectoryUser) -> Result<()>;

    async fn delete_user(&self, ctx: &RequestContext, user_id: &str) -> Result<()>;

    /// One page of users starting at the zero-based `first`
    async fn list_users(&self, ctx: &RequestContext, first: u64, max: u32) -> Result<Vec<DirectoryUser>>;

    async fn count_users(&self, ctx: &RequestContext) -> Result<u64>;

    async fn list_realm_roles(&self, ctx: &RequestContext) -> Result<Vec<Role>>;

    /// All users holding `role_name` (unpaginated)
    async fn list_users_by_role(&self, ctx: &RequestContext, role_name: &str) -> Result<Vec<DirectoryUser>>;

    async fn get_assigned_roles(&self, ctx: &RequestContext, user_id: &str) -> Result<Vec<Role>>;

    async fn get_available_roles(&self, ctx: &RequestContext, user_id: &str) -> Result<Vec<Role>>;

    async fn assign_roles(&self, ctx: &RequestContext, user_id: &str, roles: &[Role]) -> Result<()>;

    async fn unassign_roles(&self, ctx: &RequestContext, user_id: &str, roles: &[Role]) -> Result<()>;

    async fn send_required_actions_email(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        actions: &[RequiredAction],
    ) -> Result<()>;

    async fn reset_password(&self, ctx: &RequestContext, user_id: &str, credential: &PasswordCredential) -> Result<()>;
}
