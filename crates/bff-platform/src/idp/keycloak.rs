//! Keycloak Admin REST Adapter
//!
//! [`IdentityDirectory`] over `{url}{admin_base_path}/{realm}`:
//! - users: `/users`, `/users/{id}`, `/users/count`
//! - roles: `/roles`, `/roles/{name}/users`
//! - role mappings: `/users/{id}/role-mappings/realm[/available]`
//! - credentials and e-mails: `/users/{id}/reset-password`, `/users/{id}/execute-actions-email`

use async_trait::async_trait;
use bff_common::{DownstreamSystem, RequestContext};
use bff_config::KeycloakConfig;
use reqwest::{header::LOCATION, Method};
use std::sync::Arc;
use tracing::debug;

use super::{DirectoryUser, IdentityDirectory, PasswordCredential, RequiredAction, ServiceTokenProvider};
use crate::role::Role;
use crate::shared::downstream::{Credentials, DownstreamClient};
use crate::shared::error::{BffError, DownstreamProblem, Result};

pub struct KeycloakDirectory {
    client: DownstreamClient,
}

impl KeycloakDirectory {
    pub fn new(client: DownstreamClient) -> Self {
        Self { client }
    }

    /// Adapter for the configured realm. With a client secret, calls run under
    /// a client-credentials token; otherwise the caller's token is forwarded.
    pub fn from_config(config: &KeycloakConfig, http: reqwest::Client) -> Self {
        let mut client = DownstreamClient::new(http.clone(), config.admin_base_url(), DownstreamSystem::Keycloak);
        if let Some(secret) = &config.client_secret {
            let provider = ServiceTokenProvider::new(http, config.token_url(), config.client_id.clone(), secret.clone());
            client = client.with_credentials(Credentials::ServiceToken(Arc::new(provider)));
        }
        Self::new(client)
    }

    fn user_path(user_id: &str) -> String {
        format!("/users/{}", urlencoding::encode(user_id))
    }

    fn role_mappings_path(user_id: &str) -> String {
        format!("{}/role-mappings/realm", Self::user_path(user_id))
    }
}

#[async_trait]
impl IdentityDirectory for KeycloakDirectory {
    async fn create_user(&self, ctx: &RequestContext, user: &DirectoryUser) -> Result<String> {
        let request = self.client.request(Method::POST, "/users", ctx).await?.json(user);
        let response = self.client.execute(request, ctx, "create_user").await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| BffError::internal("Identity directory did not return the location of the created user"))?;

        debug!(request_id = %ctx.request_id, %location, "User created");
        Ok(location)
    }

    async fn get_user(&self, ctx: &RequestContext, user_id: &str) -> Result<DirectoryUser> {
        let request = self.client.request(Method::GET, &Self::user_path(user_id), ctx).await?;
        self.client.json(request, ctx, "get_user").await
    }

    async fn update_user(&self, ctx: &RequestContext, user_id: &str, user: &DirectoryUser) -> Result<()> {
        let request = self
            .client
            .request(Method::PUT, &Self::user_path(user_id), ctx)
            .await?
            .json(user);
        self.client.empty(request, ctx, "update_user").await
    }

    async fn delete_user(&self, ctx: &RequestContext, user_id: &str) -> Result<()> {
        let request = self.client.request(Method::DELETE, &Self::user_path(user_id), ctx).await?;
        self.client.empty(request, ctx, "delete_user").await
    }

    async fn list_users(&self, ctx: &RequestContext, first: u64, max: u32) -> Result<Vec<DirectoryUser>> {
        let request = self
            .client
            .request(Method::GET, "/users", ctx)
            .await?
            .query(&[("first", first.to_string()), ("max", max.to_string())]);
        self.client.json(request, ctx, "list_users").await
    }

    async fn count_users(&self, ctx: &RequestContext) -> Result<u64> {
        let request = self.client.request(Method::GET, "/users/count", ctx).await?;
        let response = self.client.execute(request, ctx, "count_users").await?;
        let body = response.text().await.map_err(|e| {
            BffError::downstream(DownstreamProblem::transport(DownstreamSystem::Keycloak, e.to_string()))
        })?;

        body.trim().parse::<u64>().map_err(|_| {
            BffError::downstream(DownstreamProblem::transport(
                DownstreamSystem::Keycloak,
                format!("User count is not a number: '{}'", body.trim()),
            ))
        })
    }

    async fn list_realm_roles(&self, ctx: &RequestContext) -> Result<Vec<Role>> {
        let request = self.client.request(Method::GET, "/roles", ctx).await?;
        self.client.json(request, ctx, "list_realm_roles").await
    }

    async fn list_users_by_role(&self, ctx: &RequestContext, role_name: &str) -> Result<Vec<DirectoryUser>> {
        let path = format!("/roles/{}/users", urlencoding::encode(role_name));
        let request = self.client.request(Method::GET, &path, ctx).await?;
        self.client.json(request, ctx, "list_users_by_role").await
    }

    async fn get_assigned_roles(&self, ctx: &RequestContext, user_id: &str) -> Result<Vec<Role>> {
        let request = self
            .client
            .request(Method::GET, &Self::role_mappings_path(user_id), ctx)
            .await?;
        self.client.json(request, ctx, "get_assigned_roles").await
    }

    async fn get_available_roles(&self, ctx: &RequestContext, user_id: &str) -> Result<Vec<Role>> {
        let path = format!("{}/available", Self::role_mappings_path(user_id));
        let request = self.client.request(Method::GET, &path, ctx).await?;
        self.client.json(request, ctx, "get_available_roles").await
    }

    async fn assign_roles(&self, ctx: &RequestContext, user_id: &str, roles: &[Role]) -> Result<()> {
        let request = self
            .client
            .request(Method::POST, &Self::role_mappings_path(user_id), ctx)
            .await?
            .json(roles);
        self.client.empty(request, ctx, "assign_roles").await
    }

    async fn unassign_roles(&self, ctx: &RequestContext, user_id: &str, roles: &[Role]) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &Self::role_mappings_path(user_id), ctx)
            .await?
            .json(roles);
        self.client.empty(request, ctx, "unassign_roles").await
    }

    async fn send_required_actions_email(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        actions: &[RequiredAction],
    ) -> Result<()> {
        let path = format!("{}/execute-actions-email", Self::user_path(user_id));
        let request = self.client.request(Method::PUT, &path, ctx).await?.json(actions);
        self.client.empty(request, ctx, "send_required_actions_email").await
    }

    async fn reset_password(&self, ctx: &RequestContext, user_id: &str, credential: &PasswordCredential) -> Result<()> {
        let path = format!("{}/reset-password", Self::user_path(user_id));
        let request = self.client.request(Method::PUT, &path, ctx).await?.json(credential);
        self.client.empty(request, ctx, "reset_password").await
    }
}
