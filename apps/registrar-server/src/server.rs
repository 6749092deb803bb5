use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use registration::RegistrationModule;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;

pub const HEALTH_PATH: &str = "/health";

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Full HTTP surface: health, registration routes, static files as the
/// fallback, wrapped in CORS, body limit, timeout and tracing layers.
#[must_use]
pub fn build_router(cfg: &AppConfig, module: &RegistrationModule) -> Router {
    let mut router = Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(module.router())
        .fallback_service(ServeDir::new(&cfg.server.static_dir));

    if cfg.cors.enabled {
        router = router.layer(build_cors_layer(&cfg.cors));
    }

    let limit = cfg.server.body_limit_bytes;
    router = router
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(DefaultBodyLimit::max(limit));

    router = router.layer(TimeoutLayer::with_status_code(
        StatusCode::GATEWAY_TIMEOUT,
        Duration::from_secs(cfg.server.request_timeout_secs),
    ));

    apply_trace_layer(router)
}

fn apply_trace_layer(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    version = ?req.version(),
                    status = Empty,
                    latency_ms = Empty,
                )
            })
            .on_response(
                |res: &axum::http::Response<axum::body::Body>,
                 latency: Duration,
                 span: &tracing::Span| {
                    span.record("status", res.status().as_u16());
                    span.record("latency_ms", latency.as_millis());
                },
            ),
    )
}

/// Build the module, bind, and serve until `shutdown` resolves.
///
/// # Errors
///
/// Fails when the module cannot be built from config, the address cannot be
/// bound, or the server stops with an I/O error.
pub async fn serve<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let module = RegistrationModule::from_config(&cfg.registration)
        .context("building registration module")?;
    let router = build_router(&cfg, &module);

    let listener = TcpListener::bind(cfg.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind_addr))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        static_dir = %cfg.server.static_dir.display(),
        "HTTP server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;
    tracing::info!("HTTP server stopped");
    Ok(())
}
