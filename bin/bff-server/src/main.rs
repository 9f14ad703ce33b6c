//! Portal BFF Server
//!
//! Serves the BFF REST APIs:
//! - Users and realm role mappings (identity directory)
//! - Realm roles
//! - Preferences and action history pass-through
//! - Health, OpenAPI (`/q/openapi`) and Swagger UI (`/swagger-ui`)
//!
//! Prometheus metrics are served on a separate port.
//!
//! ## Configuration
//!
//! TOML file from `BFF_CONFIG` or the standard search paths, overridden by
//! `BFF_*` environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BFF_HTTP_PORT` | `8080` | HTTP API port |
//! | `BFF_METRICS_PORT` | `9090` | Metrics port |
//! | `BFF_KEYCLOAK_URL` | `http://localhost:8180` | Keycloak base URL |
//! | `BFF_KEYCLOAK_REALM` | `onap` | Realm |
//! | `BFF_PREFERENCES_URL` | `http://localhost:9001` | Preferences store |
//! | `BFF_HISTORY_URL` | `http://localhost:9002` | History log |
//! | `BFF_RBAC_MODE` | `disabled` | `disabled`, `id-token` or `uma` |
//! | `LOG_FORMAT` | - | `json` for JSON logs |
//! | `RUST_LOG` | `info` | Log level |

use anyhow::{Context, Result};
use axum::{http::HeaderValue, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::{net::TcpListener, signal, sync::watch};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_swagger_ui::SwaggerUi;

use bff_config::{ConfigLoader, HttpConfig};
use bff_platform::{build_app, BffServices, RequestContextLayer};

#[tokio::main]
async fn main() -> Result<()> {
    bff_common::logging::init_logging("bff-server");

    info!("Starting Portal BFF Server");

    let config = ConfigLoader::new().load().context("Failed to load configuration")?;

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let services = BffServices::from_config(&config)?;
    let (router, mut openapi) = build_app(services);

    openapi.info.title = "Portal BFF API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description =
        Some("Users, roles, preferences and action history for the portal frontend".to_string());

    let docs: Router = SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi).into();
    let app = Router::new()
        .merge(router)
        .merge(docs.layer(RequestContextLayer::new()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Metrics server
    let metrics_addr = format!("{}:{}", config.http.host, config.http.metrics_port);
    let metrics_listener = TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_addr))?;
    info!("Metrics server listening on http://{}/metrics", metrics_addr);
    let metrics_task = tokio::spawn(serve_metrics(metrics_listener, metrics_handle, shutdown_rx));

    // API server
    let api_addr = format!("{}:{}", config.http.host, config.http.port);
    let api_listener = TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("Failed to bind API port {}", api_addr))?;
    info!("API server listening on http://{}", api_addr);
    info!("Press Ctrl+C to shutdown");

    axum::serve(api_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Shutdown signal received...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = metrics_task.await {
        warn!("Metrics server task failed: {}", e);
    }

    info!("Portal BFF Server shutdown complete");
    Ok(())
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = http
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if http.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn serve_metrics(listener: TcpListener, handle: PrometheusHandle, mut shutdown: watch::Receiver<bool>) {
    let app = Router::new().route("/metrics", get(move || async move { handle.render() }));

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await;

    if let Err(e) = result {
        warn!("Metrics server stopped with error: {}", e);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
