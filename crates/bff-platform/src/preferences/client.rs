//! Preferences store client

use async_trait::async_trait;
use bff_common::{DownstreamSystem, RequestContext};
use reqwest::Method;

use super::entity::Preferences;
use crate::shared::downstream::DownstreamClient;
use crate::shared::error::Result;

const PREFERENCES_PATH: &str = "/v1/preferences";

#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn get(&self, ctx: &RequestContext) -> Result<Preferences>;

    async fn save(&self, ctx: &RequestContext, preferences: &Preferences) -> Result<Preferences>;

    async fn update(&self, ctx: &RequestContext, preferences: &Preferences) -> Result<Preferences>;
}

/// HTTP client of the preferences store; the caller's tokens are forwarded
pub struct PreferencesClient {
    client: DownstreamClient,
}

impl PreferencesClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client: DownstreamClient::new(http, base_url, DownstreamSystem::Preferences),
        }
    }
}

#[async_trait]
impl PreferencesStore for PreferencesClient {
    async fn get(&self, ctx: &RequestContext) -> Result<Preferences> {
        let request = self.client.request(Method::GET, PREFERENCES_PATH, ctx).await?;
        self.client.json(request, ctx, "get_preferences").await
    }

    async fn save(&self, ctx: &RequestContext, preferences: &Preferences) -> Result<Preferences> {
        let request = self
            .client
            .request(Method::POST, PREFERENCES_PATH, ctx)
            .await?
            .json(preferences);
        self.client.json(request, ctx, "save_preferences").await
    }

    async fn update(&self, ctx: &RequestContext, preferences: &Preferences) -> Result<Preferences> {
        let request = self
            .client
            .request(Method::PUT, PREFERENCES_PATH, ctx)
            .await?
            .json(preferences);
        self.client.json(request, ctx, "update_preferences").await
    }
}
