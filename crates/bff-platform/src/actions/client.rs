//! History log client

use async_trait::async_trait;
use bff_common::{DownstreamSystem, RequestContext};
use reqwest::Method;

use super::entity::{ActionListResponse, ActionResponse, ActionsQuery, CreateActionRequest, HistoryActionList};
use crate::shared::downstream::DownstreamClient;
use crate::shared::error::Result;

const ACTIONS_PATH: &str = "/v1/actions";

#[async_trait]
pub trait ActionHistoryLog: Send + Sync {
    async fn create_action(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        request: &CreateActionRequest,
    ) -> Result<ActionResponse>;

    /// Actions of one user
    async fn get_actions(&self, ctx: &RequestContext, user_id: &str, query: &ActionsQuery) -> Result<ActionListResponse>;

    /// Actions of all users
    async fn list_actions(&self, ctx: &RequestContext, query: &ActionsQuery) -> Result<ActionListResponse>;

    /// Drop a user's actions older than `delete_after_hours`
    async fn delete_actions(&self, ctx: &RequestContext, user_id: &str, delete_after_hours: u32) -> Result<()>;
}

/// HTTP client of the history log; the caller's tokens are forwarded
pub struct HistoryClient {
    client: DownstreamClient,
}

impl HistoryClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client: DownstreamClient::new(http, base_url, DownstreamSystem::History),
        }
    }

    fn user_path(user_id: &str) -> String {
        format!("{}/{}", ACTIONS_PATH, urlencoding::encode(user_id))
    }
}

#[async_trait]
impl ActionHistoryLog for HistoryClient {
    async fn create_action(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        request: &CreateActionRequest,
    ) -> Result<ActionResponse> {
        let builder = self
            .client
            .request(Method::POST, &Self::user_path(user_id), ctx)
            .await?
            .json(request);
        self.client.json(builder, ctx, "create_action").await
    }

    async fn get_actions(&self, ctx: &RequestContext, user_id: &str, query: &ActionsQuery) -> Result<ActionListResponse> {
        let request = self
            .client
            .request(Method::GET, &Self::user_path(user_id), ctx)
            .await?
            .query(&query.to_query());
        let list: HistoryActionList = self.client.json(request, ctx, "get_actions").await?;
        Ok(list.into())
    }

    async fn list_actions(&self, ctx: &RequestContext, query: &ActionsQuery) -> Result<ActionListResponse> {
        let request = self
            .client
            .request(Method::GET, ACTIONS_PATH, ctx)
            .await?
            .query(&query.to_query());
        let list: HistoryActionList = self.client.json(request, ctx, "list_actions").await?;
        Ok(list.into())
    }

    async fn delete_actions(&self, ctx: &RequestContext, user_id: &str, delete_after_hours: u32) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &Self::user_path(user_id), ctx)
            .await?
            .query(&[("deleteAfterHours", delete_after_hours)]);
        self.client.empty(request, ctx, "delete_actions").await
    }
}
