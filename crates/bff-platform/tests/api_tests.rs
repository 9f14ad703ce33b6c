//! BFF API Integration Tests
//!
//! Drives the assembled router against mocked downstream systems: correlation
//! ids, problem bodies, access control and pass-through endpoints.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bff_common::DownstreamSystem;
use bff_config::{KeycloakConfig, RbacConfig, RbacMode};
use bff_platform::actions::HistoryClient;
use bff_platform::preferences::PreferencesClient;
use bff_platform::shared::downstream::DownstreamClient;
use bff_platform::{build_app, operations, AccessControl, BffServices, KeycloakDirectory};

const ADMIN_BASE: &str = "/auth/admin/realms/onap";

fn services(server: &MockServer, access: AccessControl) -> BffServices {
    let http = reqwest::Client::new();
    BffServices {
        directory: Arc::new(KeycloakDirectory::new(DownstreamClient::new(
            http.clone(),
            format!("{}{}", server.uri(), ADMIN_BASE),
            DownstreamSystem::Keycloak,
        ))),
        preferences: Arc::new(PreferencesClient::new(http.clone(), server.uri())),
        history: Arc::new(HistoryClient::new(http, server.uri())),
        access: Arc::new(access),
    }
}

fn app(server: &MockServer) -> Router {
    build_app(services(server, AccessControl::disabled())).0
}

fn id_token(roles: &[&str]) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"sub": "u1", "roles": roles}).to_string());
    format!("{}.{}.signature", header, payload)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Request-Id", "test-request")
        .body(Body::from(body.to_string()))
        .unwrap()
}

struct TestResponse {
    status: StatusCode,
    request_id: Option<String>,
    content_type: Option<String>,
    body: Value,
}

async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let header_value = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let request_id = header_value("x-request-id");
    let content_type = header_value("content-type");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        request_id,
        content_type,
        body,
    }
}

mod correlation_tests {
    use super::*;

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let server = MockServer::start().await;
        let request = Request::builder()
            .uri("/actuator/health")
            .header("X-Request-Id", "addf6005-3075-4c80-b7bc-2c70b7d42b00")
            .body(Body::empty())
            .unwrap();

        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "UP");
        assert_eq!(
            response.request_id.as_deref(),
            Some("addf6005-3075-4c80-b7bc-2c70b7d42b00")
        );
    }

    #[tokio::test]
    async fn test_request_id_is_generated_when_missing() {
        let server = MockServer::start().await;

        let response = send(app(&server), get("/actuator/health")).await;

        let request_id = response.request_id.expect("generated request id");
        assert!(uuid::Uuid::parse_str(&request_id).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_is_forwarded_downstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/preferences"))
            .and(wiremock::matchers::header("X-Request-Id", "test-request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"properties": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/preferences")
            .header("X-Request-Id", "test-request")
            .body(Body::empty())
            .unwrap();
        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::OK);
    }
    #[tokio::test]
    async fn test_unknown_route_is_problem_with_request_id() {
        let server = MockServer::start().await;
        let request = Request::builder()
            .uri("/no-such-route")
            .header("X-Request-Id", "test-request")
            .body(Body::empty())
            .unwrap();

        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.request_id.as_deref(), Some("test-request"));
        assert_eq!(response.content_type.as_deref(), Some("application/problem+json"));
        assert_eq!(response.body["status"], 404);
    }
}

mod user_tests {
    use super::*;

    async fn mock_json(server: &MockServer, verb: &str, url: String, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(url))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_user_with_realm_role() {
        let server = MockServer::start().await;
        let admin = json!([{"id": "r1", "name": "admin"}]);

        mock_json(&server, "GET", format!("{}/roles", ADMIN_BASE), 200, admin.clone()).await;
        Mock::given(method("POST"))
            .and(path(format!("{}/users", ADMIN_BASE)))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", format!("{}{}/users/u-42", server.uri(), ADMIN_BASE).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/users/u-42/role-mappings/realm", ADMIN_BASE)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/users/u-42/execute-actions-email", ADMIN_BASE)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        mock_json(
            &server,
            "GET",
            format!("{}/users/u-42", ADMIN_BASE),
            200,
            json!({"id": "u-42", "username": "u1", "email": "u1@x.com", "enabled": true}),
        )
        .await;
        mock_json(
            &server,
            "GET",
            format!("{}/users/u-42/role-mappings/realm", ADMIN_BASE),
            200,
            admin,
        )
        .await;

        let request = json_request(
            Method::POST,
            "/users",
            json!({"username": "u1", "email": "u1@x.com", "enabled": true, "roles": [{"id": "r1", "name": "admin"}]}),
        );
        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["id"], "u-42");
        assert_eq!(response.body["realmRoles"], json!(["admin"]));
    }

    #[tokio::test]
    async fn test_create_user_with_unknown_role_is_not_found() {
        let server = MockServer::start().await;
        mock_json(&server, "GET", format!("{}/roles", ADMIN_BASE), 200, json!([])).await;
        Mock::given(method("POST"))
            .and(path(format!("{}/users", ADMIN_BASE)))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let request = json_request(
            Method::POST,
            "/users",
            json!({"username": "u1", "email": "u1@x.com", "enabled": true, "roles": [{"id": "rX", "name": "ghost"}]}),
        );
        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.content_type.as_deref(), Some("application/problem+json"));
        assert_eq!(response.body["title"], "404 NOT_FOUND");
        assert_eq!(response.body["downstreamSystem"], "KEYCLOAK");
        assert!(response.body["detail"].as_str().unwrap().contains("ghost"));
        assert_eq!(response.request_id.as_deref(), Some("test-request"));
    }

    #[tokio::test]
    async fn test_keycloak_error_becomes_bad_gateway() {
        let server = MockServer::start().await;
        mock_json(
            &server,
            "GET",
            format!("{}/users/u-1", ADMIN_BASE),
            400,
            json!({"errorMessage": "Invalid user id"}),
        )
        .await;
        mock_json(
            &server,
            "GET",
            format!("{}/users/u-1/role-mappings/realm", ADMIN_BASE),
            200,
            json!([]),
        )
        .await;

        let response = send(app(&server), get("/users/u-1")).await;

        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(response.body["status"], 502);
        assert_eq!(response.body["title"], "400 BAD_REQUEST");
        assert_eq!(response.body["downstreamStatus"], 400);
        assert_eq!(response.body["downstreamSystem"], "KEYCLOAK");
        assert_eq!(response.body["downstreamMessageId"], "not set by downstream system");
        assert_eq!(response.body["detail"], "Invalid user id");
        assert!(response.request_id.is_some());
    }

    #[tokio::test]
    async fn test_list_users_scenario() {
        let server = MockServer::start().await;
        mock_json(&server, "GET", format!("{}/users/count", ADMIN_BASE), 200, json!(2)).await;
        Mock::given(method("GET"))
            .and(path(format!("{}/users", ADMIN_BASE)))
            .and(query_param("first", "0"))
            .and(query_param("max", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "user1", "username": "user1", "enabled": true},
                {"id": "user2", "username": "user2", "enabled": true}
            ])))
            .mount(&server)
            .await;
        mock_json(
            &server,
            "GET",
            format!("{}/roles", ADMIN_BASE),
            200,
            json!([{"id": "r1", "name": "admin"}, {"id": "r2", "name": "viewer"}]),
        )
        .await;
        mock_json(
            &server,
            "GET",
            format!("{}/roles/admin/users", ADMIN_BASE),
            200,
            json!([{"id": "user1"}, {"id": "user2"}]),
        )
        .await;
        mock_json(
            &server,
            "GET",
            format!("{}/roles/viewer/users", ADMIN_BASE),
            200,
            json!([{"id": "user2"}]),
        )
        .await;

        let response = send(app(&server), get("/users?page=1&pageSize=10")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["totalCount"], 2);
        assert_eq!(response.body["items"][0]["realmRoles"], json!(["admin"]));
        let mut user2_roles: Vec<String> =
            serde_json::from_value(response.body["items"][1]["realmRoles"].clone()).unwrap();
        user2_roles.sort();
        assert_eq!(user2_roles, vec!["admin", "viewer"]);
    }

    #[tokio::test]
    async fn test_page_size_above_limit_is_bad_request() {
        let server = MockServer::start().await;

        let response = send(app(&server), get("/users?page=1&pageSize=5001")).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["status"], 400);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request_problem() {
        let server = MockServer::start().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username": "u1", "email": 42"#))
            .unwrap();

        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.content_type.as_deref(), Some("application/problem+json"));
        assert_eq!(response.body["status"], 400);
        assert!(response.request_id.is_some());
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_mistyped_roles_body_is_bad_request_problem() {
        let server = MockServer::start().await;

        let response = send(
            app(&server),
            json_request(Method::PUT, "/users/u-1/roles", json!({"id": "r1", "name": "admin"})),
        )
        .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["status"], 400);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_is_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/users/u-1", ADMIN_BASE)))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/users/u-1")
            .body(Body::empty())
            .unwrap();
        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_roles_are_sorted_on_request() {
        let server = MockServer::start().await;
        mock_json(
            &server,
            "GET",
            format!("{}/roles", ADMIN_BASE),
            200,
            json!([{"id": "r2", "name": "viewer"}, {"id": "r1", "name": "admin"}]),
        )
        .await;

        let response = send(app(&server), get("/roles?sort=-name")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["totalCount"], 2);
        assert_eq!(response.body["items"][0]["name"], "viewer");

        let response = send(app(&server), get("/roles?sort=name")).await;
        assert_eq!(response.body["items"][0]["name"], "admin");
    }
}

mod access_tests {
    use super::*;

    fn id_token_app(server: &MockServer) -> Router {
        let mut rbac = RbacConfig {
            mode: RbacMode::IdToken,
            ..Default::default()
        };
        rbac.access_control
            .insert(operations::ROLE_LIST.to_string(), vec!["portal_admin".to_string()]);
        let access = AccessControl::new(&rbac, &KeycloakConfig::default(), reqwest::Client::new()).unwrap();
        build_app(services(server, access)).0
    }

    #[tokio::test]
    async fn test_missing_identity_is_forbidden() {
        let server = MockServer::start().await;

        let response = send(id_token_app(&server), get("/roles")).await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["status"], 403);
        assert!(response.request_id.is_some());
    }

    #[tokio::test]
    async fn test_matching_role_is_allowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/roles", ADMIN_BASE)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/roles")
            .header("X-Auth-Identity", format!("Bearer {}", id_token(&["portal_admin"])))
            .body(Body::empty())
            .unwrap();
        let response = send(id_token_app(&server), request).await;

        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_operation_without_entry_is_forbidden() {
        let server = MockServer::start().await;

        let request = Request::builder()
            .uri("/users")
            .header("X-Auth-Identity", id_token(&["portal_admin"]))
            .body(Body::empty())
            .unwrap();
        let response = send(id_token_app(&server), request).await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_forbidden_is_decided_before_body_parsing() {
        let server = MockServer::start().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let response = send(id_token_app(&server), request).await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body["status"], 403);
    }

    #[tokio::test]
    async fn test_health_is_excluded() {
        let server = MockServer::start().await;

        let response = send(id_token_app(&server), get("/actuator/health")).await;

        assert_eq!(response.status, StatusCode::OK);
    }
}

mod passthrough_tests {
    use super::*;

    #[tokio::test]
    async fn test_preferences_are_saved() {
        let server = MockServer::start().await;
        let body = json!({"properties": {"appStarter": "value1"}});
        Mock::given(method("POST"))
            .and(path("/v1/preferences"))
            .and(wiremock::matchers::body_json(body.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let response = send(app(&server), json_request(Method::POST, "/preferences", body.clone())).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, body);
    }

    #[tokio::test]
    async fn test_actions_list_is_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/actions"))
            .and(query_param("page", "1"))
            .and(query_param("pageSize", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "actionsList": [
                    {"action": {"type": "Instantiation"}, "actionCreatedAt": "2022-09-01T10:00:00Z"}
                ],
                "totalCount": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = send(app(&server), get("/actions")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["totalCount"], 1);
        assert_eq!(response.body["items"][0]["action"]["type"], "Instantiation");
        assert!(response.body.get("actionsList").is_none());
    }

    #[tokio::test]
    async fn test_actions_page_size_above_limit_is_bad_request() {
        let server = MockServer::start().await;

        let response = send(app(&server), get("/actions/u-1?page=1&pageSize=5001&showLastHours=48")).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["status"], 400);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_actions_query_accepts_numeric_strings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/actions/u-1"))
            .and(query_param("page", "2"))
            .and(query_param("pageSize", "5"))
            .and(query_param("showLastHours", "48"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"actionsList": [], "totalCount": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let response = send(app(&server), get("/actions/u-1?page=2&pageSize=5&showLastHours=48")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["totalCount"], 0);
    }

    #[tokio::test]
    async fn test_create_action_returns_recorded_action() {
        let server = MockServer::start().await;
        let action = json!({"type": "Instantiation", "action": "create"});
        Mock::given(method("POST"))
            .and(path("/v1/actions/u-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "action": action.clone(),
                "actionCreatedAt": "2022-09-01T10:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = json_request(
            Method::POST,
            "/actions/u-1",
            json!({"userId": "u-1", "action": action.clone(), "actionCreatedAt": "2022-09-01T10:00:00Z"}),
        );
        let response = send(app(&server), request).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["action"], action);
    }

    #[tokio::test]
    async fn test_history_failure_is_attributed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/actions/u-1"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "type": "about:blank",
                "title": "Internal Server Error",
                "status": 500,
                "detail": "database unavailable"
            })))
            .mount(&server)
            .await;

        let response = send(app(&server), get("/actions/u-1?showLastHours=48")).await;

        assert_eq!(response.status, StatusCode::BAD_GATEWAY);
        assert_eq!(response.body["downstreamSystem"], "HISTORY");
        assert_eq!(response.body["downstreamStatus"], 500);
        assert_eq!(response.body["detail"], "database unavailable");
    }
}

mod openapi_tests {
    use super::*;

    #[tokio::test]
    async fn test_document_lists_every_route() {
        let server = MockServer::start().await;
        let (_, openapi) = build_app(services(&server, AccessControl::disabled()));

        for route in [
            "/users",
            "/users/{id}",
            "/users/{id}/password",
            "/users/{id}/roles",
            "/users/{id}/roles/available",
            "/roles",
            "/preferences",
            "/actions",
            "/actions/{userId}",
            "/actuator/health",
        ] {
            assert!(openapi.paths.paths.contains_key(route), "missing {}", route);
        }
    }
}
