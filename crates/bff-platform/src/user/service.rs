//! User Directory Aggregator
//!
//! Composes single identity directory calls into the user operations the
//! portal needs:
//! - create: validate requested roles, create, assign, send the
//!   update-password e-mail, read back
//! - get: user and assigned roles concurrently
//! - list: one page of users plus the realm-wide role membership fan-out
//! - role replacement: clear, then set
//!
//! Nothing here is transactional. A failure part way through a sequence
//! leaves the earlier writes in place.

use bff_common::{DownstreamSystem, RequestContext};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entity::{CreateUserRequest, UpdatePasswordRequest, UpdateUserRequest, UserListResponse, UserResponse};
use super::roles::{absent_roles, group_role_names_by_user, user_id_from_location};
use crate::idp::{IdentityDirectory, RequiredAction};
use crate::role::{Role, RoleListResponse};
use crate::shared::api_common::PaginationParams;
use crate::shared::error::{interpolate_details, BffError, Result};
use crate::shared::sorting::SortResolver;

const NEW_USER_ACTIONS: [RequiredAction; 1] = [RequiredAction::UpdatePassword];
const ROLES_NOT_FOUND: &str = "Roles not found in the realm: %1";

pub struct UserDirectoryAggregator {
    directory: Arc<dyn IdentityDirectory>,
    role_sorting: SortResolver<Role>,
}

impl UserDirectoryAggregator {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        let role_sorting = SortResolver::new()
            .with("id", |a: &Role, b: &Role| a.id.cmp(&b.id))
            .with("name", |a: &Role, b: &Role| a.name.cmp(&b.name));

        Self {
            directory,
            role_sorting,
        }
    }

    pub async fn create_user(&self, ctx: &RequestContext, request: CreateUserRequest) -> Result<UserResponse> {
        request.validate()?;

        let realm_roles = self.directory.list_realm_roles(ctx).await?;
        let absent = absent_roles(&request.roles, &realm_roles);
        if !absent.is_empty() {
            let names: Vec<&str> = absent.iter().map(|r| r.name.as_str()).collect();
            warn!(request_id = %ctx.request_id, roles = ?names, "Requested roles do not exist in the realm");
            let detail = interpolate_details(&[format!("[{}]", names.join(", "))], ROLES_NOT_FOUND);
            return Err(BffError::not_found(DownstreamSystem::Keycloak, detail));
        }

        let location = self.directory.create_user(ctx, &request.to_directory_user()).await?;
        let user_id = user_id_from_location(&location).ok_or_else(|| {
            BffError::internal(format!("Cannot extract a user id from location '{}'", location))
        })?;

        if !request.roles.is_empty() {
            self.directory.assign_roles(ctx, &user_id, &request.roles).await?;
        }
        self.directory
            .send_required_actions_email(ctx, &user_id, &NEW_USER_ACTIONS)
            .await?;

        info!(
            request_id = %ctx.request_id,
            user_id = %user_id,
            username = %request.username,
            roles = request.roles.len(),
            "User created"
        );

        self.get_user(ctx, &user_id).await
    }

    pub async fn get_user(&self, ctx: &RequestContext, user_id: &str) -> Result<UserResponse> {
        let (user, roles) = tokio::try_join!(
            self.directory.get_user(ctx, user_id),
            self.directory.get_assigned_roles(ctx, user_id),
        )?;

        let role_names = roles.into_iter().map(|r| r.name).collect();
        Ok(UserResponse::from_directory(user, role_names))
    }

    /// One page of users with realm role names.
    ///
    /// `totalCount` and the page come from separate calls and can disagree
    /// under concurrent writes. Role names come from one membership lookup per
    /// realm role, not per user on the page.
    pub async fn list_users(&self, ctx: &RequestContext, pagination: PaginationParams) -> Result<UserListResponse> {
        let pagination = pagination.validated()?;

        let (total_count, users, realm_roles) = tokio::try_join!(
            self.directory.count_users(ctx),
            self.directory
                .list_users(ctx, pagination.offset(), pagination.page_size()),
            self.directory.list_realm_roles(ctx),
        )?;

        let memberships = try_join_all(realm_roles.into_iter().map(|role| async move {
            let members = self.directory.list_users_by_role(ctx, &role.name).await?;
            Ok::<_, BffError>((role.name, members))
        }))
        .await?;
        let mut role_names = group_role_names_by_user(&memberships);

        debug!(
            request_id = %ctx.request_id,
            page = pagination.page(),
            page_size = pagination.page_size(),
            returned = users.len(),
            total_count,
            "Listed users"
        );

        let items = users
            .into_iter()
            .map(|user| {
                let roles = user
                    .id
                    .as_deref()
                    .and_then(|id| role_names.remove(id))
                    .unwrap_or_default();
                UserResponse::from_directory(user, roles)
            })
            .collect();

        Ok(UserListResponse { items, total_count })
    }

    pub async fn update_user(&self, ctx: &RequestContext, user_id: &str, request: UpdateUserRequest) -> Result<()> {
        request.validate()?;
        self.directory
            .update_user(ctx, user_id, &request.to_directory_user())
            .await?;
        info!(request_id = %ctx.request_id, user_id, "User updated");
        Ok(())
    }

    pub async fn delete_user(&self, ctx: &RequestContext, user_id: &str) -> Result<()> {
        self.directory.delete_user(ctx, user_id).await?;
        info!(request_id = %ctx.request_id, user_id, "User deleted");
        Ok(())
    }

    pub async fn update_password(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        request: UpdatePasswordRequest,
    ) -> Result<()> {
        request.validate()?;
        self.directory
            .reset_password(ctx, user_id, &request.to_credential())
            .await?;
        info!(request_id = %ctx.request_id, user_id, temporary = request.temporary, "Password reset");
        Ok(())
    }

    pub async fn list_assigned_roles(&self, ctx: &RequestContext, user_id: &str) -> Result<RoleListResponse> {
        let roles = self.directory.get_assigned_roles(ctx, user_id).await?;
        Ok(roles.into())
    }

    pub async fn list_available_roles(&self, ctx: &RequestContext, user_id: &str) -> Result<RoleListResponse> {
        let roles = self.directory.get_available_roles(ctx, user_id).await?;
        Ok(roles.into())
    }

    /// Replace the user's realm roles with exactly `roles`.
    ///
    /// Current roles are removed first, then the new set is added. A failure
    /// between the two steps leaves the user with no roles.
    pub async fn update_assigned_roles(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        roles: Vec<Role>,
    ) -> Result<RoleListResponse> {
        let current = self.directory.get_assigned_roles(ctx, user_id).await?;
        if !current.is_empty() {
            self.directory.unassign_roles(ctx, user_id, &current).await?;
        }
        if !roles.is_empty() {
            self.directory.assign_roles(ctx, user_id, &roles).await?;
        }

        info!(
            request_id = %ctx.request_id,
            user_id,
            removed = current.len(),
            assigned = roles.len(),
            "User roles replaced"
        );

        self.list_assigned_roles(ctx, user_id).await
    }

    /// All realm roles, optionally sorted by `id` and/or `name`
    pub async fn list_realm_roles(&self, ctx: &RequestContext, sort: Option<&str>) -> Result<RoleListResponse> {
        let mut roles = self.directory.list_realm_roles(ctx).await?;
        if let Some(sort) = sort {
            self.role_sorting.sort(&mut roles, sort);
        }
        Ok(roles.into())
    }
}
