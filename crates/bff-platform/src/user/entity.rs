//! User DTOs
//!
//! Public request/response shapes and their mapping onto directory records.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::idp::{DirectoryUser, PasswordCredential, RequiredAction};
use crate::role::Role;
use crate::shared::error::{BffError, Result};

fn default_enabled() -> bool {
    true
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Realm roles to assign; each must match an existing role by id and name
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(BffError::validation("username must not be blank"));
        }
        validate_email(&self.email)
    }

    /// Directory record for a new user; every new user must change the password
    pub fn to_directory_user(&self) -> DirectoryUser {
        DirectoryUser {
            id: None,
            username: Some(self.username.clone()),
            email: Some(self.email.clone()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            enabled: Some(self.enabled),
            required_actions: vec![RequiredAction::UpdatePassword],
        }
    }
}

/// Update user request. Username and roles are not changed here.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)
    }

    pub fn to_directory_user(&self) -> DirectoryUser {
        DirectoryUser {
            email: Some(self.email.clone()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            enabled: Some(self.enabled),
            ..Default::default()
        }
    }
}

/// Update password request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub value: String,
    /// Force another change on next login
    #[serde(default)]
    pub temporary: bool,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Result<()> {
        if self.value.is_empty() {
            return Err(BffError::validation("password must not be empty"));
        }
        Ok(())
    }

    pub fn to_credential(&self) -> PasswordCredential {
        PasswordCredential::new(self.value.clone(), self.temporary)
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(BffError::validation(format!("'{}' is not a valid email address", email))),
    }
}

/// User with realm role names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub enabled: bool,
    pub realm_roles: Vec<String>,
}

impl UserResponse {
    pub fn from_directory(user: DirectoryUser, realm_roles: Vec<String>) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            enabled: user.enabled.unwrap_or(false),
            realm_roles,
        }
    }
}

/// Page of users
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    /// All users in the realm, independent of the page
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"username":"u1","email":"u1@x.com"}"#).unwrap();
        assert!(req.enabled);
        assert!(req.roles.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_new_users_must_update_password() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"username":"u1","email":"u1@x.com","enabled":false}"#).unwrap();
        let user = req.to_directory_user();
        assert_eq!(user.required_actions, vec![RequiredAction::UpdatePassword]);
        assert_eq!(user.enabled, Some(false));
        assert!(user.id.is_none());
    }

    #[test]
    fn test_validation() {
        let mut req: CreateUserRequest =
            serde_json::from_str(r#"{"username":" ","email":"u1@x.com"}"#).unwrap();
        assert!(req.validate().is_err());

        req.username = "u1".into();
        req.email = "not-an-email".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_serializes_realm_roles() {
        let user = DirectoryUser {
            id: Some("42".into()),
            username: Some("u1".into()),
            enabled: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(UserResponse::from_directory(user, vec!["admin".into()])).unwrap();
        assert_eq!(json["realmRoles"], serde_json::json!(["admin"]));
        assert!(json.get("email").is_none());
    }
}
