//! BFF Error Types
//!
//! Every failure leaves the service as an `application/problem+json` body.
//! Downstream failures always answer 502; the original status survives in
//! `downstreamStatus`.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bff_common::DownstreamSystem;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Message id used when the downstream system did not provide one
pub const MESSAGE_ID_NOT_SET: &str = "not set by downstream system";

const PROBLEM_TYPE: &str = "about:blank";
const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// A failure reported by (or while talking to) a downstream system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamProblem {
    pub system: DownstreamSystem,
    /// Status the downstream answered with
    pub status: u16,
    pub detail: Option<String>,
    pub message_id: Option<String>,
}

impl DownstreamProblem {
    pub fn new(system: DownstreamSystem, status: u16, detail: Option<String>) -> Self {
        Self {
            system,
            status,
            detail,
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// The request never produced a usable response (connect, timeout, decode)
    pub fn transport(system: DownstreamSystem, detail: impl Into<String>) -> Self {
        Self::new(system, StatusCode::BAD_GATEWAY.as_u16(), Some(detail.into()))
    }

    /// Build a problem from a non-2xx response body.
    ///
    /// Keycloak answers `{error, errorMessage}`; the portal stores answer
    /// problem objects whose `type` doubles as message id.
    pub fn from_body(system: DownstreamSystem, status: u16, body: &str) -> Self {
        let raw = Some(body.trim().to_string()).filter(|b| !b.is_empty());

        match system {
            DownstreamSystem::Keycloak => {
                let detail = serde_json::from_str::<KeycloakErrorBody>(body)
                    .ok()
                    .and_then(|e| e.error_message.or(e.error))
                    .or(raw);
                Self::new(system, status, detail)
            }
            DownstreamSystem::Preferences | DownstreamSystem::History => {
                match serde_json::from_str::<StoreProblemBody>(body) {
                    Ok(problem) => {
                        let mut result = Self::new(system, status, problem.detail.or(problem.title).or(raw));
                        result.message_id = problem.problem_type.filter(|t| t != PROBLEM_TYPE);
                        result
                    }
                    Err(_) => Self::new(system, status, raw),
                }
            }
        }
    }
}

impl std::fmt::Display for DownstreamProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} responded with {}: {}",
            self.system,
            self.status,
            self.detail.as_deref().unwrap_or("no detail")
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeycloakErrorBody {
    error: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoreProblemBody {
    #[serde(rename = "type")]
    problem_type: Option<String>,
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Error, Debug)]
pub enum BffError {
    #[error("Downstream error: {0}")]
    Downstream(DownstreamProblem),

    /// Locally detected absence of something the downstream system owns
    #[error("Not found: {detail}")]
    NotFound { system: DownstreamSystem, detail: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("No route for {path}")]
    RouteNotFound { path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BffError {
    pub fn downstream(problem: DownstreamProblem) -> Self {
        Self::Downstream(problem)
    }

    pub fn not_found(system: DownstreamSystem, detail: impl Into<String>) -> Self {
        Self::NotFound {
            system,
            detail: detail.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BffError::Downstream(_) => StatusCode::BAD_GATEWAY,
            BffError::NotFound { .. } | BffError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            BffError::Validation { .. } => StatusCode::BAD_REQUEST,
            BffError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BffError::Json(_) | BffError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as a problem body
    pub fn to_problem(&self) -> ProblemDetail {
        let status = self.status();
        match self {
            BffError::Downstream(problem) => ProblemDetail {
                problem_type: Some(PROBLEM_TYPE.to_string()),
                title: status_title(problem.status),
                status: status.as_u16(),
                detail: problem.detail.clone(),
                downstream_system: Some(problem.system),
                downstream_status: Some(problem.status),
                downstream_message_id: Some(
                    problem
                        .message_id
                        .clone()
                        .unwrap_or_else(|| MESSAGE_ID_NOT_SET.to_string()),
                ),
            },
            BffError::NotFound { system, detail } => ProblemDetail {
                downstream_system: Some(*system),
                ..ProblemDetail::local(status, Some(detail.clone()))
            },
            BffError::Validation { message } | BffError::Forbidden { message } => {
                ProblemDetail::local(status, Some(message.clone()))
            }
            BffError::RouteNotFound { path } => {
                ProblemDetail::local(status, Some(format!("No route for {}", path)))
            }
            BffError::Json(err) => ProblemDetail::local(status, Some(err.to_string())),
            BffError::Internal { message } => ProblemDetail::local(status, Some(message.clone())),
        }
    }
}

/// Malformed or mistyped request bodies are client errors
impl From<JsonRejection> for BffError {
    fn from(rejection: JsonRejection) -> Self {
        BffError::validation(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, BffError>;

/// Problem detail body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_system: Option<DownstreamSystem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream_message_id: Option<String>,
}

impl ProblemDetail {
    fn local(status: StatusCode, detail: Option<String>) -> Self {
        Self {
            problem_type: Some(PROBLEM_TYPE.to_string()),
            title: status_title(status.as_u16()),
            status: status.as_u16(),
            detail,
            downstream_system: None,
            downstream_status: None,
            downstream_message_id: None,
        }
    }
}

impl IntoResponse for BffError {
    fn into_response(self) -> Response {
        match &self {
            BffError::Json(_) | BffError::Internal { .. } => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        let mut response = (self.status(), Json(self.to_problem())).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

/// `"<code> <REASON>"`, e.g. `"404 NOT_FOUND"`
pub fn status_title(code: u16) -> String {
    let reason = StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|r| r.to_ascii_uppercase().replace([' ', '-'], "_"));

    match reason {
        Some(reason) => format!("{} {}", code, reason),
        None => code.to_string(),
    }
}

/// Replace `%1`, `%2`, ... in `text` with the given variables.
///
/// Higher indices are substituted first so `%1` never eats the prefix of `%10`.
pub fn interpolate_details(variables: &[String], text: &str) -> String {
    variables
        .iter()
        .enumerate()
        .rev()
        .fold(text.to_string(), |acc, (i, variable)| {
            acc.replace(&format!("%{}", i + 1), variable)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_title() {
        assert_eq!(status_title(404), "404 NOT_FOUND");
        assert_eq!(status_title(400), "400 BAD_REQUEST");
        assert_eq!(status_title(502), "502 BAD_GATEWAY");
        assert_eq!(status_title(599), "599");
    }

    #[test]
    fn test_keycloak_body_prefers_error_message() {
        let problem = DownstreamProblem::from_body(
            DownstreamSystem::Keycloak,
            409,
            r#"{"error":"conflict","errorMessage":"User exists with same username"}"#,
        );
        assert_eq!(problem.detail.as_deref(), Some("User exists with same username"));
        assert_eq!(problem.status, 409);

        let problem = DownstreamProblem::from_body(DownstreamSystem::Keycloak, 401, r#"{"error":"HTTP 401 Unauthorized"}"#);
        assert_eq!(problem.detail.as_deref(), Some("HTTP 401 Unauthorized"));

        let problem = DownstreamProblem::from_body(DownstreamSystem::Keycloak, 500, "boom");
        assert_eq!(problem.detail.as_deref(), Some("boom"));
    }

    #[test]
    fn test_history_problem_body_carries_message_id() {
        let problem = DownstreamProblem::from_body(
            DownstreamSystem::History,
            404,
            r#"{"type":"HIST-0001","title":"Not Found","status":404,"detail":"No actions for user"}"#,
        );
        assert_eq!(problem.detail.as_deref(), Some("No actions for user"));
        assert_eq!(problem.message_id.as_deref(), Some("HIST-0001"));
    }

    #[test]
    fn test_downstream_error_renders_as_bad_gateway() {
        let err = BffError::downstream(
            DownstreamProblem::new(DownstreamSystem::Keycloak, 400, Some("bad".to_string())),
        );
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let problem = err.to_problem();
        assert_eq!(problem.status, 502);
        assert_eq!(problem.title, "400 BAD_REQUEST");
        assert_eq!(problem.downstream_status, Some(400));
        assert_eq!(problem.downstream_system, Some(DownstreamSystem::Keycloak));
        assert_eq!(problem.downstream_message_id.as_deref(), Some(MESSAGE_ID_NOT_SET));
    }

    #[test]
    fn test_not_found_keeps_attribution() {
        let problem = BffError::not_found(DownstreamSystem::Keycloak, "Roles not found in the realm: [ghost]").to_problem();
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "404 NOT_FOUND");
        assert_eq!(problem.downstream_system, Some(DownstreamSystem::Keycloak));
        assert_eq!(problem.downstream_status, None);
    }

    #[test]
    fn test_problem_serializes_camel_case() {
        let body = serde_json::to_value(
            BffError::downstream(DownstreamProblem::new(DownstreamSystem::Preferences, 503, None)).to_problem(),
        )
        .unwrap();
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["downstreamSystem"], "PREFERENCES");
        assert_eq!(body["downstreamStatus"], 503);
        assert!(body.get("detail").is_none());
    }

    #[test]
    fn test_interpolate_details() {
        let vars = vec!["alice".to_string(), "HISTORY".to_string()];
        assert_eq!(
            interpolate_details(&vars, "User %1 not found in %2"),
            "User alice not found in HISTORY"
        );
        assert_eq!(interpolate_details(&[], "nothing %1"), "nothing %1");
    }
}
