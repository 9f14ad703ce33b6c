//! Downstream HTTP client
//!
//! Thin wrapper over a shared `reqwest::Client` bound to one downstream
//! system. Threads the caller's correlation id and credentials, turns non-2xx
//! answers into attributed [`BffError::Downstream`] errors and records call
//! metrics.

use bff_common::{DownstreamSystem, RequestContext, X_AUTH_IDENTITY, X_REQUEST_ID};
use bff_config::DownstreamConfig;
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::idp::service_token::ServiceTokenProvider;
use crate::shared::error::{BffError, DownstreamProblem, Result};

/// Build the HTTP client shared by every downstream
pub fn build_http_client(config: &DownstreamConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .pool_idle_timeout(config.pool_idle_timeout())
        .use_rustls_tls()
        .build()
        .map_err(|e| BffError::internal(format!("Failed to build HTTP client: {}", e)))
}

/// How outgoing requests authenticate
#[derive(Clone)]
pub enum Credentials {
    /// Forward the caller's `Authorization` and `X-Auth-Identity` headers
    ForwardCaller,
    /// Use a client-credentials token of the BFF itself
    ServiceToken(Arc<ServiceTokenProvider>),
}

#[derive(Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    base_url: String,
    system: DownstreamSystem,
    credentials: Credentials,
}

impl DownstreamClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, system: DownstreamSystem) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            system,
            credentials: Credentials::ForwardCaller,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a request carrying correlation id and credentials
    pub async fn request(&self, method: Method, path: &str, ctx: &RequestContext) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header(X_REQUEST_ID, &ctx.request_id);

        match &self.credentials {
            Credentials::ForwardCaller => {
                if let Some(authorization) = &ctx.authorization {
                    builder = builder.header(AUTHORIZATION, authorization);
                }
                if let Some(identity) = &ctx.identity {
                    builder = builder.header(X_AUTH_IDENTITY, identity);
                }
            }
            Credentials::ServiceToken(provider) => {
                let token = provider.token().await?;
                builder = builder.bearer_auth(token);
            }
        }
        Ok(builder)
    }

    /// Send and fail on non-2xx
    pub async fn execute(&self, builder: RequestBuilder, ctx: &RequestContext, operation: &'static str) -> Result<Response> {
        let started = Instant::now();
        let result = builder.send().await;
        let elapsed = started.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.record(operation, "transport_error", elapsed);
                warn!(
                    request_id = %ctx.request_id,
                    system = %self.system,
                    operation,
                    error = %e,
                    "bff - error - downstream request failed"
                );
                return Err(BffError::downstream(DownstreamProblem::transport(self.system, e.to_string())));
            }
        };

        let status = response.status();
        if status.is_success() {
            self.record(operation, "success", elapsed);
            debug!(
                request_id = %ctx.request_id,
                system = %self.system,
                operation,
                status = status.as_u16(),
                "Downstream call succeeded"
            );
            return Ok(response);
        }

        self.record(operation, "error", elapsed);
        if status == reqwest::StatusCode::UNAUTHORIZED {
            if let Credentials::ServiceToken(provider) = &self.credentials {
                provider.invalidate();
            }
        }
        let body = response.text().await.unwrap_or_default();
        let problem = DownstreamProblem::from_body(self.system, status.as_u16(), &body);
        warn!(
            request_id = %ctx.request_id,
            system = %self.system,
            operation,
            downstream_status = problem.status,
            detail = problem.detail.as_deref().unwrap_or_default(),
            "bff - error - downstream answered with error"
        );
        Err(BffError::downstream(problem))
    }

    /// Send and decode a JSON body
    pub async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder, ctx: &RequestContext, operation: &'static str) -> Result<T> {
        let response = self.execute(builder, ctx, operation).await?;
        response.json::<T>().await.map_err(|e| {
            BffError::downstream(DownstreamProblem::transport(
                self.system,
                format!("Undecodable {} response: {}", operation, e),
            ))
        })
    }

    /// Send and ignore the body
    pub async fn empty(&self, builder: RequestBuilder, ctx: &RequestContext, operation: &'static str) -> Result<()> {
        self.execute(builder, ctx, operation).await.map(|_| ())
    }

    fn record(&self, operation: &'static str, outcome: &'static str, elapsed_secs: f64) {
        let system = self.system.as_str();
        metrics::counter!(
            "bff.downstream.requests_total",
            "system" => system,
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "bff.downstream.duration_seconds",
            "system" => system,
            "operation" => operation
        )
        .record(elapsed_secs);
    }
}
