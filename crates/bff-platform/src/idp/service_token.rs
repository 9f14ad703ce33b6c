//! Client-credentials service token
//!
//! Admin API calls can run under the BFF's own client instead of the
//! caller's token. Tokens are cached until shortly before they expire.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use bff_common::DownstreamSystem;

use crate::shared::error::{BffError, DownstreamProblem, Result};

/// Refresh this long before the token's expiry
const EXPIRY_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

pub struct ServiceTokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceTokenProvider {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: RwLock::new(None),
        }
    }

    /// A valid access token, fetched when the cached one is missing or stale
    pub async fn token(&self) -> Result<String> {
        let cached = self.cached.read().clone();
        if let Some(token) = cached.filter(|t| t.is_valid(Utc::now())) {
            return Ok(token.access_token);
        }

        let fetched = self.fetch().await?;
        let access_token = fetched.access_token.clone();
        let expires_in = fetched.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        *self.cached.write() = Some(CachedToken {
            access_token: fetched.access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        });

        debug!(client_id = %self.client_id, expires_in, "Service token refreshed");
        Ok(access_token)
    }

    /// Drop the cached token
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    async fn fetch(&self) -> Result<TokenResponse> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                BffError::downstream(DownstreamProblem::transport(
                    DownstreamSystem::Keycloak,
                    format!("Token request failed: {}", e),
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BffError::downstream(DownstreamProblem::from_body(
                DownstreamSystem::Keycloak,
                status.as_u16(),
                &body,
            )));
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            BffError::downstream(DownstreamProblem::transport(
                DownstreamSystem::Keycloak,
                format!("Undecodable token response: {}", e),
            ))
        })
    }
}
