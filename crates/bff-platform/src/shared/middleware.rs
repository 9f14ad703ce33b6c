//! API Middleware
//!
//! Builds the per-request [`RequestContext`] (correlation id, caller tokens,
//! route) and mirrors `X-Request-Id` on every response.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderValue, Method, Request, Uri},
    response::Response,
};
use bff_common::{RequestContext, X_AUTH_IDENTITY, X_REQUEST_ID};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info, info_span, Instrument};

use crate::shared::error::BffError;

/// Caller context extractor
///
/// Reads the context stored by [`RequestContextLayer`], or builds one from the
/// request headers when the layer is not installed.
pub struct Caller(pub RequestContext);

impl std::ops::Deref for Caller {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = BffError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = match parts.extensions.get::<RequestContext>() {
            Some(context) => context.clone(),
            None => build_context(&parts.method, &parts.uri, &parts.headers),
        };
        Ok(Caller(context))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build the context for one inbound request; a missing or blank
/// `X-Request-Id` gets a fresh UUID.
pub fn build_context(method: &Method, uri: &Uri, headers: &HeaderMap) -> RequestContext {
    let mut context = match header_str(headers, X_REQUEST_ID) {
        Some(request_id) => RequestContext::new(request_id),
        None => RequestContext::generate(),
    }
    .with_route(method.as_str(), uri.path());

    if let Some(authorization) = header_str(headers, AUTHORIZATION.as_str()) {
        context = context.with_authorization(authorization);
    }
    if let Some(identity) = header_str(headers, X_AUTH_IDENTITY) {
        context = context.with_identity(identity);
    }
    context
}

/// Middleware layer that installs the [`RequestContext`] and echoes the
/// correlation id
#[derive(Clone, Default)]
pub struct RequestContextLayer;

impl RequestContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestContextLayer {
    type Service = RequestContextMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestContextMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct RequestContextMiddleware<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestContextMiddleware<S>
where
    S: Service<Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let context = build_context(req.method(), req.uri(), req.headers());
        let request_id = context.request_id.clone();

        let span = info_span!("request", request_id = %request_id);
        info!(
            parent: &span,
            method = %context.method,
            path = %context.path,
            "bff - request"
        );

        req.extensions_mut().insert(context);
        let future = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = future.await?;
                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    response.headers_mut().insert(X_REQUEST_ID, value);
                }
                info!(status = response.status().as_u16(), "bff - response");
                Ok(response)
            }
            .instrument(span),
        )
    }
}
